use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::debouncer::{ChangeKind, Debouncer, is_temp_file};
use super::{FsActor, changed_documents, forward};
use crate::actor::messages::{EngineMsg, FsMsg};
use crate::core::DocumentName;
use crate::document::{FsStore, MemoryStore, PageStore};

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn name(raw: &str) -> DocumentName {
    DocumentName::parse(raw).unwrap()
}

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new(Duration::ZERO);
    assert!(!debouncer.is_ready());
    assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
}

#[test]
fn test_event_kinds() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(&make_event(vec!["/p/a.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/p/b.html"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/p/c.html"], remove_kind()));

    assert_eq!(debouncer.changes[&PathBuf::from("/p/a.html")], ChangeKind::Created);
    assert_eq!(debouncer.changes[&PathBuf::from("/p/b.html")], ChangeKind::Modified);
    assert_eq!(debouncer.changes[&PathBuf::from("/p/c.html")], ChangeKind::Removed);
}

#[test]
fn test_metadata_change_ignored() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    let kind = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ));
    debouncer.add_event(&make_event(vec!["/p/a.html"], kind));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(&make_event(
        vec!["/p/.a.html.swp", "/p/a.html~", "/p/a.html.tmp", "/p/a.html"],
        modify_kind(),
    ));
    assert_eq!(debouncer.changes.len(), 1);

    assert!(is_temp_file(&PathBuf::from("/p/4913.bak")));
    assert!(!is_temp_file(&PathBuf::from("/p/index.html")));
}

#[test]
fn test_burst_collapses_to_one_change() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    for _ in 0..10 {
        debouncer.add_event(&make_event(vec!["/p/a.html"], modify_kind()));
    }
    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(&make_event(vec!["/p/a.html"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/p/a.html"], create_kind()));
    assert_eq!(debouncer.changes[&PathBuf::from("/p/a.html")], ChangeKind::Created);
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(&make_event(vec!["/p/a.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/p/a.html"], remove_kind()));
    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(&make_event(vec!["/p/a.html"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/p/a.html"], remove_kind()));
    assert_eq!(debouncer.changes[&PathBuf::from("/p/a.html")], ChangeKind::Removed);
}

#[test]
fn test_window_not_elapsed() {
    let mut debouncer = Debouncer::new(Duration::from_secs(60));
    debouncer.add_event(&make_event(vec!["/p/a.html"], modify_kind()));
    assert!(!debouncer.is_ready());
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() > Duration::from_secs(50));
}

#[test]
fn test_changed_documents_filters() {
    let dir = PathBuf::from("/p");
    let mut changes = FxHashMap::default();
    changes.insert(PathBuf::from("/p/b.html"), ChangeKind::Modified);
    changes.insert(PathBuf::from("/p/a.html"), ChangeKind::Created);
    changes.insert(PathBuf::from("/p/unwatched.html"), ChangeKind::Modified);
    changes.insert(PathBuf::from("/p/sub/a.html"), ChangeKind::Modified);

    let watched: FxHashSet<_> = [name("a.html"), name("b.html")].into_iter().collect();
    assert_eq!(
        changed_documents(&dir, changes, &watched),
        vec![name("a.html"), name("b.html")]
    );
}

#[test]
fn test_forward_reads_and_drops_failed() {
    let store = MemoryStore::with(&[("a.html", "<p>a</p>")]);
    let mut watched: FxHashSet<_> = [name("a.html"), name("gone.html")].into_iter().collect();
    let (tx, mut rx) = mpsc::channel(8);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime
        .block_on(forward(
            vec![name("a.html"), name("gone.html")],
            &mut watched,
            &store,
            &tx,
        ))
        .unwrap();

    assert!(matches!(
        rx.try_recv(),
        Ok(EngineMsg::SourceChanged { name: n, content }) if n == name("a.html") && content == "<p>a</p>"
    ));
    assert!(matches!(
        rx.try_recv(),
        Ok(EngineMsg::SourceFailed { name: n, .. }) if n == name("gone.html")
    ));
    assert!(watched.contains(&name("a.html")));
    assert!(!watched.contains(&name("gone.html")));
}

#[test]
fn test_actor_forwards_file_change() {
    let temp = TempDir::new().unwrap();
    let page = temp.path().join("a.html");
    std::fs::write(&page, "<p>1</p>").unwrap();

    let store: Arc<dyn PageStore> = Arc::new(FsStore::new(temp.path()));
    let (fs_tx, fs_rx) = mpsc::unbounded_channel();
    let (engine_tx, mut engine_rx) = mpsc::channel(8);
    let actor = FsActor::new(
        temp.path(),
        Duration::from_millis(20),
        fs_rx,
        engine_tx,
        store,
    )
    .unwrap();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let received = runtime.block_on(async {
        fs_tx.send(FsMsg::Watch(name("a.html"))).unwrap();
        let test = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(&page, "<p>2</p>").unwrap();
            let received = tokio::time::timeout(Duration::from_secs(5), engine_rx.recv()).await;
            fs_tx.send(FsMsg::Shutdown).unwrap();
            received
        };
        let ((), received) = tokio::join!(actor.run(), test);
        received
    });

    assert!(matches!(
        received,
        Ok(Some(EngineMsg::SourceChanged { content, .. })) if content == "<p>2</p>"
    ));
}
