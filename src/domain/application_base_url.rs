use reqwest::Url;
use serde::{de::Visitor, Deserialize, Deserializer};
use std::fmt;

/// Root URL the service is reachable at. Its path is always `/`, so joining
/// an absolute route onto it never drops a prefix.
#[derive(Debug, Clone)]
pub struct ApplicationBaseUrl(Url);

impl AsRef<Url> for ApplicationBaseUrl {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ApplicationBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for ApplicationBaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ApplicationBaseUrlVisitor;

        impl<'de> Visitor<'de> for ApplicationBaseUrlVisitor {
            type Value = ApplicationBaseUrl;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a base url string such as `http://127.0.0.1:8000/`")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                ApplicationBaseUrl::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ApplicationBaseUrlVisitor)
    }
}

impl ApplicationBaseUrl {
    pub fn parse(url: &str) -> Result<Self, String> {
        let url = Url::parse(url).map_err(|e| e.to_string())?;
        if url.cannot_be_a_base() || url.path() != "/" {
            return Err(format!("expected base url. found: {url}"));
        }
        Ok(Self(url))
    }

    pub fn join(&self, path: &str) -> Result<Url, String> {
        self.0.join(path).map_err(|e| e.to_string())
    }
}
