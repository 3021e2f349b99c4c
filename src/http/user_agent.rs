//! Best-effort operating system detection from `User-Agent` headers.
//!
//! Substring rules are checked from most to least specific: phone and
//! ChromeOS agents also advertise a desktop platform token, and Android
//! agents always carry `Linux`.

use std::fmt;

/// Operating system family derived from a `User-Agent` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Windows,
    WindowsPhone,
    Android,
    MacOs,
    Ios,
    Linux,
    ChromeOs,
    FreeBsd,
    BlackBerry,
    /// Header absent, not valid UTF-8, or not recognised.
    Unknown,
}

impl OsFamily {
    /// Parse a raw header value. Never fails.
    pub fn from_header(value: Option<&[u8]>) -> Self {
        value
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .map(Self::from_user_agent)
            .unwrap_or(OsFamily::Unknown)
    }

    pub fn from_user_agent(ua: &str) -> Self {
        let has = |token: &str| ua.contains(token);

        if has("Windows Phone") {
            OsFamily::WindowsPhone
        } else if has("Windows") {
            OsFamily::Windows
        } else if has("CrOS") {
            OsFamily::ChromeOs
        } else if has("Android") {
            OsFamily::Android
        } else if has("iPhone") || has("iPad") || has("iPod") {
            OsFamily::Ios
        } else if has("Macintosh") || has("Mac OS X") {
            OsFamily::MacOs
        } else if has("FreeBSD") {
            OsFamily::FreeBsd
        } else if has("BlackBerry") || has("BB10") {
            OsFamily::BlackBerry
        } else if has("Linux") || has("X11") {
            OsFamily::Linux
        } else {
            OsFamily::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::WindowsPhone => "Windows Phone",
            OsFamily::Android => "Android",
            OsFamily::MacOs => "macOS",
            OsFamily::Ios => "iOS",
            OsFamily::Linux => "Linux",
            OsFamily::ChromeOs => "ChromeOS",
            OsFamily::FreeBsd => "FreeBSD",
            OsFamily::BlackBerry => "BlackBerry",
            OsFamily::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_common_agents() {
        let cases = [
            (
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36",
                OsFamily::Windows,
            ),
            (
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Version/17.0 Safari/605.1.15",
                OsFamily::MacOs,
            ),
            (
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
                OsFamily::Ios,
            ),
            (
                "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0 Mobile Safari/537.36",
                OsFamily::Android,
            ),
            (
                "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
                OsFamily::Linux,
            ),
            (
                "Mozilla/5.0 (X11; CrOS x86_64 14541.0.0) AppleWebKit/537.36 Chrome/120.0 Safari/537.36",
                OsFamily::ChromeOs,
            ),
            (
                "Mozilla/5.0 (Windows Phone 10.0; Android 6.0.1; Microsoft; Lumia 950) Edge/15.14977",
                OsFamily::WindowsPhone,
            ),
        ];

        for (ua, expected) in cases {
            assert_eq!(OsFamily::from_user_agent(ua), expected, "{ua}");
        }
    }

    #[test]
    fn unparseable_input_is_unknown() {
        assert_eq!(OsFamily::from_user_agent("curl/8.4.0"), OsFamily::Unknown);
        assert_eq!(OsFamily::from_user_agent(""), OsFamily::Unknown);
        assert_eq!(OsFamily::from_header(None), OsFamily::Unknown);
        assert_eq!(OsFamily::from_header(Some(&[0xff, 0xfe])), OsFamily::Unknown);
    }

    #[test]
    fn labels() {
        assert_eq!(OsFamily::MacOs.to_string(), "macOS");
        assert_eq!(OsFamily::Unknown.to_string(), "unknown");
    }
}
