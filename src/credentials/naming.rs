/// Pick a credential name that does not clash with `existing`.
///
/// Only names starting with `requested` count. With one such name the
/// result is `"<requested> 2"`; with several it is one past the highest
/// numeric suffix, and never lower than `"<requested> 3"`. A suffix counts
/// only when the whole remainder is a number that can still be incremented.
pub fn unique_credential_name<'a, I>(requested: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let found: Vec<&str> = existing
        .into_iter()
        .filter(|name| name.starts_with(requested))
        .collect();

    match found.len() {
        0 => requested.to_string(),
        1 => format!("{} 2", requested),
        _ => {
            let prefix = format!("{} ", requested);
            let next = found
                .iter()
                .filter_map(|name| name.strip_prefix(prefix.as_str()))
                .filter_map(|suffix| suffix.parse::<u64>().ok())
                .filter_map(|suffix| suffix.checked_add(1))
                .fold(3, u64::max);
            format!("{} {}", requested, next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_name() {
        assert_eq!(unique_credential_name("Slack", ["GitHub"]), "Slack");
    }

    #[test]
    fn test_single_clash() {
        assert_eq!(unique_credential_name("Slack", ["Slack"]), "Slack 2");
        assert_eq!(unique_credential_name("Slack", ["Slack account"]), "Slack 2");
    }

    #[test]
    fn test_several_clashes() {
        assert_eq!(unique_credential_name("Slack", ["Slack", "Slack 2"]), "Slack 3");
        assert_eq!(
            unique_credential_name("Slack", ["Slack", "Slack 2", "Slack 7", "Slack old"]),
            "Slack 8"
        );
        assert_eq!(unique_credential_name("Slack", ["Slack", "Slack old"]), "Slack 3");
    }

    #[test]
    fn test_only_whole_numbers_count() {
        assert_eq!(unique_credential_name("Slack", ["Slack", "Slack 7x"]), "Slack 3");
        assert_eq!(unique_credential_name("Slack", ["Slack", "Slack 12abc", "Slack 4"]), "Slack 5");
    }

    #[test]
    fn test_largest_suffix_does_not_overflow() {
        assert_eq!(
            unique_credential_name("Slack", ["Slack", "Slack 18446744073709551615"]),
            "Slack 3"
        );
        assert_eq!(
            unique_credential_name("Slack", ["Slack", "Slack 18446744073709551614"]),
            "Slack 18446744073709551615"
        );
    }
}
