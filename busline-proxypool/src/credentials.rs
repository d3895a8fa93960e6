use rand::Rng;

/// Chrome major.minor.build.patch strings seen in the wild recently enough
/// to blend in; paired at random with an OS token below.
const CHROME_VERSIONS: &[&str] = &[
    "120.0.0.0",
    "121.0.0.0",
    "122.0.0.0",
    "123.0.0.0",
    "124.0.0.0",
    "125.0.0.0",
];

const OS_TOKENS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
];

/// Build a random `Chrome on <os>` User-Agent string.
pub(crate) fn random_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let chrome = CHROME_VERSIONS[rng.gen_range(0..CHROME_VERSIONS.len())];
    let os = OS_TOKENS[rng.gen_range(0..OS_TOKENS.len())];
    format!(
        "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{chrome} Safari/537.36"
    )
}

/// Per-client SOCKS5 credentials: a 64-bit username and a 128-bit password,
/// both hex-encoded.
pub(crate) struct ProxyCredentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

pub(crate) fn random_credentials() -> ProxyCredentials {
    let mut rng = rand::thread_rng();
    let username: u64 = rng.gen();
    let password: u128 = rng.gen();
    ProxyCredentials {
        username: format!("{username:016x}"),
        password: format!("{password:032x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{random_credentials, random_user_agent};

    #[test]
    fn credentials_have_expected_widths() {
        let creds = random_credentials();
        assert_eq!(16, creds.username.len());
        assert_eq!(32, creds.password.len());
    }

    #[test]
    fn user_agent_mentions_chrome() {
        assert!(random_user_agent().contains("Chrome/"));
    }
}
