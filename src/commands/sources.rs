//! Knowledge-source management

use crate::app::App;
use crate::error::{Error, Result};
use crate::models::{KnowledgeSource, SourceKind};

/// Add a source to the front of the list. Link sources must carry a
/// syntactically valid URL as their content.
pub fn add_source(app: &mut App, title: &str, content: &str, kind: SourceKind) -> Result<String> {
    if title.trim().is_empty() {
        return Err(Error::Config("source title must not be empty".to_string()));
    }

    if kind == SourceKind::Link {
        url::Url::parse(content.trim())
            .map_err(|e| Error::Config(format!("invalid link URL: {}", e)))?;
    }

    let source = KnowledgeSource::new(title, content, kind);
    let id = source.id.clone();
    app.sources.insert(0, source);
    app.save_sources();

    Ok(id)
}

/// Flip a source's active flag; returns the new state
pub fn toggle_source(app: &mut App, source_id: &str) -> Result<bool> {
    let source = app
        .sources
        .iter_mut()
        .find(|s| s.id == source_id)
        .ok_or_else(|| Error::Store(format!("source not found: {}", source_id)))?;

    source.is_active = !source.is_active;
    let active = source.is_active;
    app.save_sources();
    Ok(active)
}

pub fn delete_source(app: &mut App, source_id: &str) -> Result<()> {
    let before = app.sources.len();
    app.sources.retain(|s| s.id != source_id);

    if app.sources.len() == before {
        return Err(Error::Store(format!("source not found: {}", source_id)));
    }

    app.save_sources();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store_service::StateStore;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let app = App::with_store(StateStore::with_root(dir.path()));
        (dir, app)
    }

    #[test]
    fn test_add_source_prepends() {
        let (_dir, mut app) = test_app();
        let seeded = app.sources.len();

        add_source(&mut app, "بخشنامه جدید", "متن بخشنامه", SourceKind::Text).unwrap();

        assert_eq!(app.sources.len(), seeded + 1);
        assert_eq!(app.sources[0].title, "بخشنامه جدید");
        assert!(app.sources[0].is_active);
    }

    #[test]
    fn test_add_link_source_validates_url() {
        let (_dir, mut app) = test_app();

        assert!(add_source(&mut app, "Portal", "not a url", SourceKind::Link).is_err());
        assert!(add_source(&mut app, "Portal", "https://example.com/terms", SourceKind::Link).is_ok());
    }

    #[test]
    fn test_toggle_flips_active_flag() {
        let (_dir, mut app) = test_app();
        let id = add_source(&mut app, "t", "c", SourceKind::Text).unwrap();

        assert!(!toggle_source(&mut app, &id).unwrap());
        assert!(toggle_source(&mut app, &id).unwrap());
    }

    #[test]
    fn test_delete_unknown_source_errors() {
        let (_dir, mut app) = test_app();
        assert!(delete_source(&mut app, "missing").is_err());
    }
}
