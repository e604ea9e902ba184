/// Turns stored media paths into absolute URLs for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUrls {
    /// `scheme://host`, or empty when the request carried no `Host`.
    origin: String,
}

impl MediaUrls {
    pub fn from_origin(host: Option<&str>, forwarded_proto: Option<&str>) -> Self {
        let origin = match host.map(str::trim).filter(|host| !host.is_empty()) {
            Some(host) => {
                let scheme = forwarded_proto
                    .and_then(|proto| proto.split(',').next())
                    .map(str::trim)
                    .filter(|proto| !proto.is_empty())
                    .unwrap_or("http");
                format!("{}://{}", scheme, host)
            }
            None => String::new(),
        };
        Self { origin }
    }

    /// Values that are already URLs pass through; relative paths land under `/media/`.
    pub fn absolute(&self, value: &str) -> String {
        if value.starts_with("http") {
            return value.to_string();
        }
        let path = if value.starts_with('/') {
            value.to_string()
        } else {
            format!("/media/{}", value)
        };
        format!("{}{}", self.origin, path)
    }

    /// [`Self::absolute`] for optional fields; empty values become `None`.
    pub fn optional(&self, value: Option<&str>) -> Option<String> {
        value
            .filter(|value| !value.is_empty())
            .map(|value| self.absolute(value))
    }
}
