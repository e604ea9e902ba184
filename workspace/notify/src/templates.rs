use std::sync::Arc;

use tera::{Context, Tera};

use crate::Result;

const BUILTIN: &[(&str, &str)] = &[
    ("email/base.html", include_str!("../templates/email/base.html")),
    ("email/verification.html", include_str!("../templates/email/verification.html")),
    ("email/verification.txt", include_str!("../templates/email/verification.txt")),
    ("email/password_reset.html", include_str!("../templates/email/password_reset.html")),
    ("email/password_reset.txt", include_str!("../templates/email/password_reset.txt")),
    ("email/account_approved.html", include_str!("../templates/email/account_approved.html")),
    ("email/account_approved.txt", include_str!("../templates/email/account_approved.txt")),
    ("email/account_rejected.html", include_str!("../templates/email/account_rejected.html")),
    ("email/account_rejected.txt", include_str!("../templates/email/account_rejected.txt")),
    (
        "email/portfolio_published.html",
        include_str!("../templates/email/portfolio_published.html"),
    ),
    (
        "email/portfolio_published.txt",
        include_str!("../templates/email/portfolio_published.txt"),
    ),
    (
        "email/portfolio_unpublished.html",
        include_str!("../templates/email/portfolio_unpublished.html"),
    ),
    (
        "email/portfolio_unpublished.txt",
        include_str!("../templates/email/portfolio_unpublished.txt"),
    ),
    ("email/contact_reply.html", include_str!("../templates/email/contact_reply.html")),
    (
        "pages/verification_result.html",
        include_str!("../templates/pages/verification_result.html"),
    ),
];

/// Tera templates compiled into the binary. `.html` templates are auto-escaped, `.txt`
/// templates are not.
#[derive(Debug, Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn builtin() -> Result<Self> {
        Self::from_raw(BUILTIN.iter().copied())
    }

    pub fn from_raw<'a>(templates: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(name, context)?)
    }
}
