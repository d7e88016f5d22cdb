//! Encrypted source files
//!
//! `copy` and `template` accept a `decrypt_password`. The engine does not
//! implement a cipher itself; it hands the source path and password to a
//! [`Decrypt`] implementation, which returns the path of a decrypted copy.

use std::path::{Path, PathBuf};

/// Turns an encrypted file into a readable temporary copy
pub trait Decrypt {
    /// Decrypt `path` with `password`, returning the decrypted file's path.
    fn decrypt(&self, path: &Path, password: &str) -> anyhow::Result<PathBuf>;
}

impl<F> Decrypt for F
where
    F: Fn(&Path, &str) -> anyhow::Result<PathBuf>,
{
    fn decrypt(&self, path: &Path, password: &str) -> anyhow::Result<PathBuf> {
        self(path, password)
    }
}
