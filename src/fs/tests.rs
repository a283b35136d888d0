use super::*;
use std::io::SeekFrom;
use std::time::Duration;
use tempfile::TempDir;

fn sample_tree() -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    fs.write_file(Path::new("/a/one"), "111111");
    fs.write_file(Path::new("/a/b/nine"), "999999");
    fs.write_file(Path::new("/a/b/c/d/four"), "444444");
    fs
}

#[test]
fn memory_write_creates_parents() {
    let fs = sample_tree();

    assert!(fs.exists(Path::new("/a/b/c/d")));
    let meta = fs
        .metadata(Path::new("/a/b/c"))
        .expect("directory should exist");
    assert!(meta.is_dir);

    let meta = fs
        .metadata(Path::new("/a/b/nine"))
        .expect("file should exist");
    assert!(!meta.is_dir);
    assert_eq!(meta.len, 6);
}

#[test]
fn memory_read_dir_lists_immediate_children() {
    let fs = sample_tree();

    let names: Vec<String> = fs
        .read_dir(Path::new("/a"))
        .expect("should list /a")
        .into_iter()
        .map(|entry| entry.name)
        .collect();

    assert_eq!(names, vec!["b".to_string(), "one".to_string()]);
}

#[test]
fn memory_open_and_seek() {
    let fs = sample_tree();
    fs.write_file(Path::new("/a/letters"), "abcdefgh");

    let mut file = fs.open(Path::new("/a/letters")).expect("should open file");
    file.seek(SeekFrom::Start(3)).expect("should seek");
    let mut buf = [0u8; 2];
    file.read_exact(&mut buf).expect("should read");

    assert_eq!(&buf, b"de");
}

#[test]
fn memory_write_requires_parent() {
    let fs = MemoryFileSystem::new();
    fs.create_dir_all(Path::new("/a"));

    assert!(fs.write(Path::new("/a/file"), b"data").is_ok());
    assert!(fs.write(Path::new("/missing/file"), b"data").is_err());
}

#[test]
fn memory_remove_file() {
    let fs = sample_tree();

    fs.remove_file(Path::new("/a/one"))
        .expect("should remove file");
    assert!(!fs.exists(Path::new("/a/one")));

    let err = fs
        .remove_file(Path::new("/a/one"))
        .expect_err("second remove should fail");
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
    assert!(fs.remove_file(Path::new("/a/b")).is_err());
}

#[test]
fn memory_set_modified() {
    let fs = sample_tree();
    let later = SystemTime::now() + Duration::from_secs(3600);

    fs.set_modified(Path::new("/a/one"), later)
        .expect("should set mtime");
    let meta = fs.metadata(Path::new("/a/one")).expect("file should exist");
    assert_eq!(meta.modified, later);

    assert!(fs.set_modified(Path::new("/nope"), later).is_err());
}

#[test]
fn default_walk_is_preorder() {
    let fs = sample_tree();

    let paths: Vec<PathBuf> = fs
        .walk(Path::new("/a/b"))
        .expect("should walk")
        .into_iter()
        .map(|entry| entry.path)
        .collect();

    assert_eq!(
        paths,
        vec![
            PathBuf::from("/a/b"),
            PathBuf::from("/a/b/c"),
            PathBuf::from("/a/b/c/d"),
            PathBuf::from("/a/b/c/d/four"),
            PathBuf::from("/a/b/nine"),
        ]
    );
}

#[test]
fn os_filesystem_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let fs = OsFileSystem;
    let nested = temp_dir.path().join("nested");
    std::fs::create_dir(&nested).expect("should create dir");

    fs.write(&nested.join("note.txt"), b"hello world")
        .expect("should write");
    let data = fs.read(&nested.join("note.txt")).expect("should read");
    assert_eq!(data, b"hello world");

    let entries = fs.read_dir(temp_dir.path()).expect("should list");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].metadata.is_dir);

    let walked = fs.walk(temp_dir.path()).expect("should walk");
    assert_eq!(walked.len(), 3);
    assert_eq!(walked[2].name, "note.txt");

    fs.remove_file(&nested.join("note.txt"))
        .expect("should remove");
    assert!(fs.metadata(&nested.join("note.txt")).is_err());
}

#[cfg(unix)]
#[test]
fn os_read_dir_does_not_follow_directory_links() {
    use std::os::unix::fs::symlink;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let root = temp_dir.path();
    std::fs::create_dir(root.join("real")).expect("should create dir");
    std::fs::write(root.join("notes.txt"), "notes").expect("should write");
    symlink(root.join("real"), root.join("dirlink")).expect("should link dir");
    symlink(root.join("missing"), root.join("dangling")).expect("should link missing");
    symlink(root.join("notes.txt"), root.join("filelink")).expect("should link file");

    let entries = OsFileSystem.read_dir(root).expect("should list");
    let meta = |name: &str| {
        entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.metadata)
            .expect("entry should be listed")
    };

    assert!(!meta("dirlink").is_dir);
    assert!(!meta("dirlink").is_file);
    assert!(!meta("dangling").is_dir);
    assert!(!meta("dangling").is_file);
    assert!(meta("filelink").is_file);
    assert_eq!(meta("filelink").len, 5);
    assert!(meta("real").is_dir);
    assert!(meta("notes.txt").is_file);
}

#[test]
fn absolute_folds_parent_components() {
    let path = absolute(Path::new("/a/b/../c/./d")).expect("should resolve");
    assert_eq!(path, PathBuf::from("/a/c/d"));

    let relative = absolute(Path::new("x")).expect("should resolve");
    assert!(relative.is_absolute());
    assert!(relative.ends_with("x"));
}

#[test]
fn file_name_of_root_is_empty() {
    assert_eq!(file_name(Path::new("/")), "");
    assert_eq!(file_name(Path::new("/a/b.txt")), "b.txt");
}
