use std::path::PathBuf;

/// Local-filesystem media store.
///
/// Same client shape as an object-store client (constructor + `store` returning
/// a public URL), backed by a directory served as static files.
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_url: String,
}

impl MediaStore {
    pub async fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        let root = root.into();
        if let Err(e) = tokio::fs::create_dir_all(&root).await {
            tracing::warn!(error = %e, root = %root.display(), "could not create media root");
        }

        tracing::info!(root = %root.display(), "media store initialized");

        Self {
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Write a file under the media root and return its public URL.
    pub async fn store(&self, key: &str, body: Vec<u8>) -> Result<String, String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("create media dir failed: {e}"))?;
        }

        tokio::fs::write(&path, body)
            .await
            .map_err(|e| format!("media write failed: {e}"))?;

        Ok(format!("{}/{}", self.public_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("kith-media-test-{}", Uuid::now_v7()))
    }

    #[tokio::test]
    async fn store_writes_file_and_builds_url() {
        let root = scratch_dir();
        let store = MediaStore::new(&root, "http://localhost:8000/media/").await;

        let url = store
            .store("posts/abc.png", b"\x89PNG".to_vec())
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8000/media/posts/abc.png");

        let written = tokio::fs::read(root.join("posts/abc.png")).await.unwrap();
        assert_eq!(written, b"\x89PNG");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn store_creates_nested_directories() {
        let root = scratch_dir();
        let store = MediaStore::new(&root, "http://localhost:8000/media").await;

        store
            .store("a/b/c.jpg", vec![0xFF, 0xD8])
            .await
            .unwrap();
        assert!(root.join("a/b/c.jpg").exists());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
