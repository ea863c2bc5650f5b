use secrecy::SecretString;

/// Hosted backend location and keys shared by every request.
#[derive(Clone)]
pub struct GlobalArgs {
    pub backend_url: String,
    pub anon_key: Option<SecretString>,
    pub service_role_key: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(burl: String) -> Self {
        Self {
            backend_url: burl,
            anon_key: None,
            service_role_key: None,
        }
    }

    pub fn set_anon_key(&mut self, key: SecretString) {
        self.anon_key = Some(key);
    }

    pub fn set_service_role_key(&mut self, key: SecretString) {
        self.service_role_key = Some(key);
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<SecretString>| if key.is_some() { "***" } else { "unset" };
        f.debug_struct("GlobalArgs")
            .field("backend_url", &self.backend_url)
            .field("anon_key", &mask(&self.anon_key))
            .field("service_role_key", &mask(&self.service_role_key))
            .finish()
    }
}
