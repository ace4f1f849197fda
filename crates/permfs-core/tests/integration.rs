use std::thread;

use permfs_core::{
    Access, Filesystem, FsError, PermissionTriple, Session, SharedFilesystem, ROOT_DIR,
};

fn shared() -> SharedFilesystem {
    Filesystem::bootstrap().into_shared()
}

fn perms(s: &str) -> PermissionTriple {
    s.parse().expect("valid permission string")
}

#[test]
fn test_round_trip() {
    let s = Session::new(shared());
    s.create_file("/a.txt", b"X", perms("644")).unwrap();
    assert_eq!(s.read("/a.txt").unwrap(), b"X");

    s.write("/a.txt", b"Y").unwrap();
    assert_eq!(s.read("/a.txt").unwrap(), b"Y");

    let listing = s.ls("/").unwrap();
    let file = listing.files.iter().find(|f| f.name == "a.txt").unwrap();
    assert_eq!(file.size, Some(1));
}

#[test]
fn test_non_empty_guard() {
    let s = Session::new(shared());
    s.mkdir("/d", PermissionTriple::DIR_DEFAULT).unwrap();
    s.create_file("/d/f.txt", b"", PermissionTriple::FILE_DEFAULT).unwrap();

    assert_eq!(s.rm("/d"), Err(FsError::NotEmpty("/d".into())));

    assert!(s.ls("/d").is_ok());
    assert_eq!(s.read("/d/f.txt").unwrap(), b"");
}

#[test]
fn test_collision_guard() {
    let s = Session::new(shared());
    s.mkdir("/d", perms("750")).unwrap();
    s.create_file("/d/keep.txt", b"kept", PermissionTriple::FILE_DEFAULT).unwrap();

    assert_eq!(
        s.mkdir("/d", PermissionTriple::DIR_DEFAULT),
        Err(FsError::AlreadyExists("/d".into()))
    );

    let root = s.ls("/").unwrap();
    let d = root.directories.iter().find(|e| e.name == "d").unwrap();
    assert_eq!(d.permissions, perms("750"));
    assert_eq!(s.read("/d/keep.txt").unwrap(), b"kept");
}

#[test]
fn test_root_dotdot_fixed_point() {
    let mut s = Session::new(shared());
    for _ in 0..5 {
        s.cd("..").unwrap();
        assert_eq!(s.pwd().unwrap(), "/");
        assert_eq!(s.current_dir(), ROOT_DIR);
    }
    s.cd("../../home/../..").unwrap();
    assert_eq!(s.pwd().unwrap(), "/");
}

#[test]
fn test_cross_user_isolation() {
    let mut s = Session::new(shared());

    s.su("usuario1").unwrap();
    s.mkdir("/home/usuario1/docs", perms("755")).unwrap();
    s.create_file("/home/usuario1/docs/secret.txt", b"secret", perms("600"))
        .unwrap();

    s.su("usuario2").unwrap();
    assert_eq!(
        s.read("/home/usuario1/docs/secret.txt"),
        Err(FsError::PermissionDenied {
            path: "/home/usuario1/docs/secret.txt".into(),
            access: Access::Read,
        })
    );

    s.su("root").unwrap();
    s.chmod("/home/usuario1/docs/secret.txt", perms("644")).unwrap();

    s.su("usuario2").unwrap();
    assert_eq!(s.read("/home/usuario1/docs/secret.txt").unwrap(), b"secret");
}

#[test]
fn test_ownership_transfer_root_only() {
    let mut s = Session::new(shared());
    s.su("usuario1").unwrap();
    s.mkdir("/home/usuario1/docs", perms("755")).unwrap();
    s.create_file("/home/usuario1/docs/secret.txt", b"secret", perms("600"))
        .unwrap();

    s.su("usuario2").unwrap();
    assert!(matches!(
        s.chown("/home/usuario1/docs/secret.txt", "usuario2"),
        Err(FsError::PermissionDenied { .. })
    ));
    assert!(s.read("/home/usuario1/docs/secret.txt").is_err());

    s.su("root").unwrap();
    s.chown("/home/usuario1/docs/secret.txt", "usuario2").unwrap();

    // The owner digit (6) now applies to usuario2 and no longer to usuario1,
    // who falls to the group digit (0).
    s.su("usuario2").unwrap();
    assert_eq!(s.read("/home/usuario1/docs/secret.txt").unwrap(), b"secret");
    s.write("/home/usuario1/docs/secret.txt", b"mine now").unwrap();

    s.su("usuario1").unwrap();
    assert!(matches!(
        s.read("/home/usuario1/docs/secret.txt"),
        Err(FsError::PermissionDenied { access: Access::Read, .. })
    ));
}

#[test]
fn test_file_and_directory_may_share_a_name() {
    let s = Session::new(shared());
    s.mkdir("/same", PermissionTriple::DIR_DEFAULT).unwrap();
    s.create_file("/same", b"file", PermissionTriple::FILE_DEFAULT).unwrap();

    let listing = s.ls("/").unwrap();
    assert!(listing.directories.iter().any(|e| e.name == "same"));
    assert!(listing.files.iter().any(|e| e.name == "same"));
    assert_eq!(s.read("/same").unwrap(), b"file");

    // The file is removed first, then the directory.
    s.rm("/same").unwrap();
    assert!(s.read("/same").is_err());
    assert!(s.ls("/same").is_ok());
    s.rm("/same").unwrap();
    assert!(s.ls("/same").is_err());
}

#[test]
fn test_stale_cwd_after_su() {
    let mut s = Session::new(shared());
    s.su("usuario1").unwrap();
    s.mkdir("/home/usuario1/private", perms("700")).unwrap();
    s.cd("/home/usuario1/private").unwrap();
    s.create_file("plan.txt", b"", PermissionTriple::FILE_DEFAULT).unwrap();

    s.su("usuario2").unwrap();
    assert_eq!(s.pwd().unwrap(), "/home/usuario1/private");
    assert!(matches!(s.ls("."), Err(FsError::PermissionDenied { .. })));
    assert!(matches!(
        s.create_file("mine.txt", b"", PermissionTriple::FILE_DEFAULT),
        Err(FsError::PermissionDenied { .. })
    ));

    // Absolute paths still work from the stale directory.
    assert!(s.ls("/home/usuario2").is_ok());
}

#[test]
fn test_cwd_removed_by_another_session() {
    let fs = shared();
    let mut a = Session::new(fs.clone());
    let b = Session::new(fs);

    a.mkdir("/tmp", PermissionTriple::OPEN).unwrap();
    a.cd("/tmp").unwrap();
    b.rm("/tmp").unwrap();

    assert_eq!(a.pwd(), Err(FsError::NotFound(".".into())));
    assert!(a.ls(".").is_err());
    assert!(a.create_file("x", b"", PermissionTriple::FILE_DEFAULT).is_err());

    a.cd("/").unwrap();
    assert_eq!(a.pwd().unwrap(), "/");
}

#[test]
fn test_sessions_are_independent() {
    let fs = shared();
    let mut a = Session::new(fs.clone());
    let mut b = Session::login(fs, "usuario1").unwrap();

    a.cd("/home").unwrap();
    b.cd("/home/usuario1").unwrap();
    a.su("usuario2").unwrap();

    assert_eq!(a.pwd().unwrap(), "/home");
    assert_eq!(b.pwd().unwrap(), "/home/usuario1");
    assert_eq!(a.whoami(), "usuario2");
    assert_eq!(b.whoami(), "usuario1");

    b.create_file("shared.txt", b"from b", perms("644")).unwrap();
    assert_eq!(a.read("usuario1/shared.txt").unwrap(), b"from b");
}

#[test]
fn test_concurrent_sessions_on_one_tree() {
    let fs = shared();
    let workers = 8;
    let files_per_worker = 25;

    let handles: Vec<_> = (0..workers)
        .map(|w| {
            let fs = fs.clone();
            thread::spawn(move || {
                let s = Session::new(fs);
                let dir = format!("/w{w}");
                s.mkdir(&dir, PermissionTriple::DIR_DEFAULT).unwrap();
                for i in 0..files_per_worker {
                    let path = format!("{dir}/f{i}");
                    s.create_file(&path, path.as_bytes(), PermissionTriple::FILE_DEFAULT)
                        .unwrap();
                }
                // Everyone races on the same name; exactly one wins.
                s.mkdir("/contested", PermissionTriple::DIR_DEFAULT).is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);

    let s = Session::new(fs);
    for w in 0..workers {
        let listing = s.ls(&format!("/w{w}")).unwrap();
        assert_eq!(listing.files.len(), files_per_worker);
        let path = format!("/w{w}/f0");
        assert_eq!(s.read(&path).unwrap(), path.as_bytes());
    }
}

#[test]
fn test_errors_leave_tree_usable() {
    let mut s = Session::new(shared());
    s.su("usuario2").unwrap();

    assert!(s.mkdir("/home/usuario1/x", PermissionTriple::DIR_DEFAULT).is_err());
    assert_eq!(s.rm("/home"), Err(FsError::NotEmpty("/home".into())));
    assert!(s.chmod("/home", PermissionTriple::from_mode(0o700)).is_err());
    assert!(s.chown("/home", "usuario2").is_err());
    assert!(s.su("ghost").is_err());

    assert_eq!(s.whoami(), "usuario2");
    s.cd("/home/usuario2").unwrap();
    s.create_file("ok.txt", b"ok", PermissionTriple::FILE_DEFAULT).unwrap();
    assert_eq!(s.read("ok.txt").unwrap(), b"ok");
}
