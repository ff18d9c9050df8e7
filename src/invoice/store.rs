//! Rendered-invoice storage.
//!
//! A directory-rooted blob store addressed by invoice number. Written once
//! per invoice; reads and deletes go through the same key. The public URL
//! convention mirrors the on-disk name: `/invoices/{number}.pdf`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{BillingError, Result};

#[derive(Debug, Clone)]
pub struct PdfStore {
    root: PathBuf,
}

impl PdfStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location for an invoice number.
    pub fn path_for(&self, invoice_number: &str) -> PathBuf {
        self.root.join(format!("{invoice_number}.pdf"))
    }

    /// Public path the surrounding web layer serves the document under.
    pub fn public_url(invoice_number: &str) -> String {
        format!("/invoices/{invoice_number}.pdf")
    }

    /// Write the rendered document, creating the store directory if absent.
    pub async fn save(&self, invoice_number: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BillingError::storage(format!("creating {}", self.root.display()), e))?;

        let path = self.path_for(invoice_number);
        fs::write(&path, bytes)
            .await
            .map_err(|e| BillingError::storage(format!("writing {}", path.display()), e))?;
        Ok(path)
    }

    /// Read a stored document back.
    pub async fn load(&self, invoice_number: &str) -> Result<Vec<u8>> {
        let path = self.path_for(invoice_number);
        fs::read(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BillingError::not_found("invoice pdf", invoice_number)
            } else {
                BillingError::storage(format!("reading {}", path.display()), e)
            }
        })
    }

    pub async fn exists(&self, invoice_number: &str) -> bool {
        fs::try_exists(self.path_for(invoice_number))
            .await
            .unwrap_or(false)
    }

    /// Remove a stored document. Removing a missing document is not an
    /// error.
    pub async fn delete(&self, invoice_number: &str) -> Result<()> {
        let path = self.path_for(invoice_number);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BillingError::storage(
                format!("deleting {}", path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path().join("invoices"));

        let path = store.save("BK-2026-000001", b"%PDF-data").await.unwrap();
        assert!(path.ends_with("BK-2026-000001.pdf"));
        assert!(store.exists("BK-2026-000001").await);
        assert_eq!(store.load("BK-2026-000001").await.unwrap(), b"%PDF-data");
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path());
        let err = store.load("BK-2026-999999").await.unwrap_err();
        assert!(matches!(err, BillingError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path());

        store.save("BK-2026-000002", b"%PDF").await.unwrap();
        store.delete("BK-2026-000002").await.unwrap();
        assert!(!store.exists("BK-2026-000002").await);
        // second delete is a no-op
        store.delete("BK-2026-000002").await.unwrap();
    }

    #[test]
    fn test_public_url_convention() {
        assert_eq!(
            PdfStore::public_url("BK-2026-000042"),
            "/invoices/BK-2026-000042.pdf"
        );
    }
}
