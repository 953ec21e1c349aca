use reqwest::{blocking::Client, Url};
use xcg_xsd::{FsResolver, ImportError, ImportResolver, ResolvedDocument};

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Loads `http(s)` locations over the network and everything else from the filesystem.
/// Relative references inside a remote document resolve against its URL.
#[derive(Clone, Debug, Default)]
pub struct RemoteResolver {
    client: Client,
}

impl RemoteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn fetch(&self, url: Url) -> Result<ResolvedDocument, ImportError> {
        tracing::debug!(%url, "fetching schema");
        let text = self
            .client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|error| ImportError::UnspecifiedLoad(Box::new(error)))?;
        Ok(ResolvedDocument {
            location: url.to_string(),
            text,
        })
    }
}

impl ImportResolver for RemoteResolver {
    fn resolve(
        &self,
        base: Option<&str>,
        location: &str,
    ) -> Result<ResolvedDocument, ImportError> {
        let url = if is_remote(location) {
            Url::parse(location)
        } else {
            match base.filter(|base| is_remote(base)) {
                Some(base) => Url::parse(base).and_then(|base| base.join(location)),
                None => return FsResolver.resolve(base, location),
            }
        };
        let url = url.map_err(|_| ImportError::UnsupportedLocation(location.to_string()))?;
        self.fetch(url)
    }
}
