use anyhow::Result;

/// bcrypt work factor for stored passwords.
pub const DEFAULT_COST: u32 = 10;

/// Salted adaptive password hashing. Work runs on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plaintext: String) -> Result<String> {
        let cost = self.cost;
        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost)).await??;
        Ok(digest)
    }

    pub async fn verify(&self, plaintext: String, digest: String) -> Result<bool> {
        let valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest)).await??;
        Ok(valid)
    }

    /// Do the work of a verification without a digest to check against.
    pub async fn burn(&self, plaintext: String) -> Result<()> {
        self.hash(plaintext).await?;
        Ok(())
    }
}
