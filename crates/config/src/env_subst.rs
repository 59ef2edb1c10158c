/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` placeholders in raw config
/// text before it is parsed.
///
/// Placeholders naming an unset variable without a fallback are left as-is so
/// the parse error (or the literal value) points at the missing variable.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable variable lookup.
pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let inner = &after[..end];
        let (name, fallback) = match inner.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (inner, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => {
                out.push_str("${");
                out.push_str(inner);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "PARLEY_TEST_PORT" => Some("4000".into()),
            "PARLEY_TEST_DB" => Some("sqlite:chat.db".into()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_vars() {
        assert_eq!(
            substitute_env_with("port = ${PARLEY_TEST_PORT}\nurl = \"${PARLEY_TEST_DB}\"", lookup),
            "port = 4000\nurl = \"sqlite:chat.db\""
        );
    }

    #[test]
    fn uses_fallback_for_unset_var() {
        assert_eq!(
            substitute_env_with("bind = \"${PARLEY_UNSET:-0.0.0.0}\"", lookup),
            "bind = \"0.0.0.0\""
        );
    }

    #[test]
    fn set_var_wins_over_fallback() {
        assert_eq!(
            substitute_env_with("${PARLEY_TEST_PORT:-1}", lookup),
            "4000"
        );
    }

    #[test]
    fn leaves_unknown_and_malformed_placeholders() {
        assert_eq!(
            substitute_env_with("${PARLEY_UNSET} ${} ${OPEN", lookup),
            "${PARLEY_UNSET} ${} ${OPEN"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(substitute_env("plain text $HOME"), "plain text $HOME");
    }
}
