pub mod bitwarden;
pub mod chrome;
pub mod dashlane;
pub mod keepass;
pub mod lastpass;
pub mod native;
pub mod onepassword;

pub(crate) fn split_tags(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn join_tags(tags: &[String], sep: &str) -> String {
    tags.join(sep)
}
