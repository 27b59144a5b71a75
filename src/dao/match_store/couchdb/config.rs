use reqwest::Url;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "match_tracker";

/// Where the CouchDB match database lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub server: Url,
    /// Database holding one document per video.
    pub database: String,
    /// Basic-auth user and password, when the server requires them.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Parse the server root; fails early on a malformed URL instead of on the first request.
    pub fn parse(server: &str, database: Option<&str>) -> CouchResult<Self> {
        let server = Url::parse(server).map_err(|err| CouchDaoError::InvalidServerUrl {
            url: server.to_owned(),
            reason: err.to_string(),
        })?;
        if server.cannot_be_a_base() {
            return Err(CouchDaoError::InvalidServerUrl {
                url: server.to_string(),
                reason: "not a hierarchical URL".into(),
            });
        }

        Ok(Self {
            server,
            database: database.unwrap_or(DEFAULT_DATABASE).to_owned(),
            credentials: None,
        })
    }

    /// Read `COUCH_BASE_URL` (required), `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    pub fn from_env() -> CouchResult<Self> {
        let server = std::env::var("COUCH_BASE_URL").map_err(|_| CouchDaoError::MissingEnvVar {
            var: "COUCH_BASE_URL",
        })?;
        let database = std::env::var("COUCH_DB").ok();

        let mut config = Self::parse(&server, database.as_deref())?;
        config.credentials = std::env::var("COUCH_USERNAME")
            .ok()
            .zip(std::env::var("COUCH_PASSWORD").ok());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_defaults_when_unset() {
        let config = CouchConfig::parse("http://localhost:5984/", None).unwrap();
        assert_eq!(config.database, "match_tracker");
        assert!(config.credentials.is_none());
    }

    #[test]
    fn malformed_server_url_is_rejected() {
        assert!(matches!(
            CouchConfig::parse("localhost:5984", None),
            Err(CouchDaoError::InvalidServerUrl { .. })
        ));
        assert!(CouchConfig::parse("not a url", Some("db")).is_err());
    }
}
