use std::path::Path;

use spotseek::catalog::*;

const CATALOG: &str = r#"{
    "t1": {
        "name": "First",
        "artist": "Band",
        "album": "Record",
        "sources": [{ "type": "album", "album_title": "Record" }]
    },
    "t2": {
        "name": "Second",
        "artist": "Band",
        "album": "Record",
        "sources": [
            { "type": "album", "album_title": "Record" },
            { "type": "playlist", "playlist_name": "Mix" },
            { "type": "playlist", "playlist_name": "Mix" }
        ]
    },
    "t3": {
        "name": "Loose",
        "artist": "Solo",
        "album": "Single",
        "sources": [{ "type": "playlist", "playlist_name": "Mix" }]
    },
    "t4": { "name": "Alone", "artist": "Nobody" }
}"#;

fn membership_track(id: &str, memberships: Vec<Membership>) -> Track {
    Track::new(id, format!("Track {}", id), "Artist", None, memberships)
}

fn find_track<'a>(catalog: &'a Catalog, id: &str) -> &'a Track {
    catalog.tracks().iter().find(|t| t.id == id).unwrap()
}

fn find_album<'a>(catalog: &'a Catalog, title: &str) -> &'a Album {
    catalog.albums().iter().find(|a| a.title == title).unwrap()
}

fn find_playlist<'a>(catalog: &'a Catalog, name: &str) -> &'a Playlist {
    catalog.playlists().iter().find(|p| p.name == name).unwrap()
}

#[test]
fn test_parse_catalog_builds_indices() {
    let catalog = parse_catalog(CATALOG).unwrap();

    assert_eq!(catalog.len(), 4);

    let album = find_album(&catalog, "Record");
    assert_eq!(album.artist, "Band");
    let ids: Vec<&str> = album.tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);

    // Duplicate memberships collapse to one
    let mix = find_playlist(&catalog, "Mix");
    let ids: Vec<&str> = mix.tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "t3"]);

    let standalone: Vec<&str> = catalog.standalone_tracks().map(|t| t.id.as_str()).collect();
    assert_eq!(standalone, vec!["t4"]);
}

#[test]
fn test_track_fields() {
    let catalog = parse_catalog(CATALOG).unwrap();

    let t2 = find_track(&catalog, "t2");
    assert!(t2.is_album_track());
    assert_eq!(
        t2.memberships,
        vec![
            Membership::Album("Record".to_string()),
            Membership::Playlist("Mix".to_string()),
        ]
    );
    assert_eq!(t2.label(), "Second - Band");

    // A playlist track may still carry an album to try first
    let t3 = find_track(&catalog, "t3");
    assert!(!t3.is_album_track());
    assert_eq!(t3.album.as_deref(), Some("Single"));
    assert!(catalog.albums().iter().all(|a| a.title != "Single"));
}

#[test]
fn test_build_catalog_keeps_first_seen_order() {
    let catalog = build_catalog(vec![
        membership_track("a", vec![Membership::Playlist("Later".into())]),
        membership_track(
            "b",
            vec![
                Membership::Album("X".into()),
                Membership::Playlist("Earlier".into()),
            ],
        ),
        membership_track("c", vec![Membership::Album("Y".into())]),
    ])
    .unwrap();

    let playlists: Vec<&str> = catalog.playlists().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(playlists, vec!["Later", "Earlier"]);

    let albums: Vec<&str> = catalog.albums().iter().map(|a| a.title.as_str()).collect();
    assert_eq!(albums, vec!["X", "Y"]);
}

#[test]
fn test_build_catalog_rejects_duplicate_ids() {
    let err = build_catalog(vec![
        membership_track("dup", Vec::new()),
        membership_track("dup", Vec::new()),
    ])
    .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::MalformedCatalogEntry { ref id, .. } if id == "dup"
    ));
}

#[test]
fn test_build_catalog_rejects_empty_name() {
    let err = build_catalog(vec![Track::new("x", " ", "Artist", None, Vec::new())]).unwrap_err();

    assert!(matches!(
        err,
        CatalogError::MalformedCatalogEntry { ref id, .. } if id == "x"
    ));
}

#[test]
fn test_parse_catalog_malformed_entries() {
    let missing_artist = r#"{ "ok": { "name": "A", "artist": "B" }, "bad": { "name": "A" } }"#;
    match parse_catalog(missing_artist) {
        Err(CatalogError::MalformedCatalogEntry { id, reason }) => {
            assert_eq!(id, "bad");
            assert!(reason.contains("artist"));
        }
        other => panic!("expected malformed entry, got {:?}", other),
    }

    let unknown_source =
        r#"{ "s": { "name": "A", "artist": "B", "sources": [{ "type": "radio" }] } }"#;
    assert!(matches!(
        parse_catalog(unknown_source),
        Err(CatalogError::MalformedCatalogEntry { ref id, .. }) if id == "s"
    ));

    assert!(matches!(
        parse_catalog("[1, 2, 3]"),
        Err(CatalogError::Json { .. })
    ));
}

#[test]
fn test_parse_catalog_empty_album_is_none() {
    let catalog = parse_catalog(r#"{ "t": { "name": "A", "artist": "B", "album": "" } }"#).unwrap();

    assert_eq!(find_track(&catalog, "t").album, None);
}

#[tokio::test]
async fn test_load_catalog_merges_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    std::fs::write(
        &first,
        r#"{ "a": { "name": "Old", "artist": "X" }, "b": { "name": "B", "artist": "X" } }"#,
    )
    .unwrap();
    std::fs::write(
        &second,
        r#"{ "c": { "name": "C", "artist": "X" }, "a": { "name": "New", "artist": "X" } }"#,
    )
    .unwrap();

    let catalog = load_catalog(&[first, second]).await.unwrap();

    // The later file wins, the first position is kept
    let ids: Vec<&str> = catalog.tracks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(find_track(&catalog, "a").name, "New");
}

#[tokio::test]
async fn test_load_catalog_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");

    assert!(matches!(
        load_catalog(&[missing]).await,
        Err(CatalogError::Io { .. })
    ));
}

#[test]
fn test_render_m3u() {
    let tracks = vec![
        Track::new("t1", "A", "X", None, Vec::new()),
        Track::new("t2", "B", "X", None, Vec::new()),
    ];

    let body = render_m3u(tracks.iter(), Path::new("out"), "mp3");

    assert_eq!(body, "#EXTM3U\nout/t1.mp3\nout/t2.mp3\n");
}

#[tokio::test]
async fn test_write_playlists() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = parse_catalog(CATALOG).unwrap();
    let layout = PlaylistLayout {
        playlist_dir: dir.path().join("playlists"),
        album_dir: dir.path().join("albums"),
        track_dir: dir.path().join("output"),
        extension: "mp3".to_string(),
    };

    let written = write_playlists(&catalog, &layout).await.unwrap();

    assert_eq!(
        written,
        vec![
            dir.path().join("playlists/Mix.m3u"),
            dir.path().join("albums/Record.m3u"),
        ]
    );

    let mix = std::fs::read_to_string(&written[0]).unwrap();
    let lines: Vec<&str> = mix.lines().collect();
    assert_eq!(lines[0], "#EXTM3U");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with("t2.mp3"));
    assert!(lines[2].ends_with("t3.mp3"));
}
