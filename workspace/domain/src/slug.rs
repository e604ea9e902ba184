use model::entities::profile;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::trace;
use unicode_normalization::UnicodeNormalization;

use crate::Result;

/// Used when a username slugifies to nothing (e.g. `"@@@"`).
const FALLBACK_SLUG: &str = "user";

/// Decomposes accented letters (NFKD) and keeps their ASCII base, lowercases, drops
/// anything that is not an ASCII letter, digit, `_`, `-` or whitespace, then collapses runs of whitespace and hyphens into a single `-` and trims `-`/`_` from
/// both ends.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value
        .nfkd()
        .filter(char::is_ascii)
        .flat_map(char::to_lowercase)
    {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// The `attempt`-th candidate for `base`: `base`, `base-1`, `base-2`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

/// True when `slug` is held by a profile other than `exclude_profile`.
pub async fn is_taken<C>(db: &C, slug: &str, exclude_profile: Option<i32>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut query = profile::Entity::find().filter(profile::Column::UsernameSlug.eq(slug));
    if let Some(id) = exclude_profile {
        query = query.filter(profile::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// First free slug derived from `username`.
///
/// Check-then-write: two concurrent requests can still pick the same value, in which case
/// the unique constraint rejects the second insert.
pub async fn unique_slug<C>(db: &C, username: &str, exclude_profile: Option<i32>) -> Result<String>
where
    C: ConnectionTrait,
{
    let mut base = slugify(username);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let mut attempt = 0;
    loop {
        let slug = candidate(&base, attempt);
        if !is_taken(db, &slug, exclude_profile).await? {
            trace!("Slug '{}' chosen for username '{}'", slug, username);
            return Ok(slug);
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{setup_db, insert_profile, insert_user};

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Alice"), "alice");
        assert_eq!(slugify("John Smith"), "john-smith");
        assert_eq!(slugify("  spaced -- out  "), "spaced-out");
        assert_eq!(slugify("first.last"), "firstlast");
        assert_eq!(slugify("snake_case"), "snake_case");
        assert_eq!(slugify("user+tag@mail"), "usertagmail");
        assert_eq!(slugify("_edge_"), "edge");
        assert_eq!(slugify("Zoë"), "zoe");
        assert_eq!(slugify("José Müller"), "jose-muller");
        // No ASCII decomposition exists for these
        assert_eq!(slugify("Ærøskøbing"), "rskbing");
        assert_eq!(slugify("@@@"), "");
    }

    #[test]
    fn test_candidates() {
        assert_eq!(candidate("foo", 0), "foo");
        assert_eq!(candidate("foo", 1), "foo-1");
        assert_eq!(candidate("foo", 12), "foo-12");
    }

    #[tokio::test]
    async fn test_colliding_usernames_get_suffixes() {
        let db = setup_db().await;

        let first = insert_user(&db, "Foo", false, false).await;
        let slug = unique_slug(&db, &first.username, None).await.unwrap();
        assert_eq!(slug, "foo");
        insert_profile(&db, first.id, &slug).await;

        let second = insert_user(&db, "foo", false, false).await;
        let slug = unique_slug(&db, &second.username, None).await.unwrap();
        assert_eq!(slug, "foo-1");
        insert_profile(&db, second.id, &slug).await;

        let third = insert_user(&db, "FOO ", false, false).await;
        assert_eq!(unique_slug(&db, &third.username, None).await.unwrap(), "foo-2");
    }

    #[tokio::test]
    async fn test_own_slug_is_not_a_collision() {
        let db = setup_db().await;

        let user = insert_user(&db, "bar", false, false).await;
        let profile = insert_profile(&db, user.id, "bar").await;

        let slug = unique_slug(&db, "bar", Some(profile.id)).await.unwrap();
        assert_eq!(slug, "bar");
        assert!(is_taken(&db, "bar", None).await.unwrap());
        assert!(!is_taken(&db, "bar", Some(profile.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_slug_falls_back() {
        let db = setup_db().await;
        assert_eq!(unique_slug(&db, "@@@", None).await.unwrap(), "user");
    }
}
