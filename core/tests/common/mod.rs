#![allow(dead_code)]

use artsearch_core::{CatalogItem, ItemId};

pub fn art(id: ItemId, title: &str, artist: &str, category: &str) -> CatalogItem {
    CatalogItem {
        id,
        title: title.into(),
        description: String::new(),
        artist: artist.into(),
        category: category.into(),
        price: None,
        year: None,
        colors: Vec::new(),
        tags: Default::default(),
    }
}

/// The two-item corpus used throughout the docs.
pub fn blue_pair() -> Vec<CatalogItem> {
    vec![
        art(1, "Blue Mountain Sunset", "Kim", "landscape"),
        art(2, "Abstract Blue Forms", "Lee", "abstract"),
    ]
}

pub fn gallery() -> Vec<CatalogItem> {
    let mut items = vec![
        CatalogItem {
            description: "Evening light over alpine ridges".into(),
            price: Some(1200.0),
            year: Some(1998),
            colors: vec!["#1e3a8a".into(), "#f97316".into(), "#fde68a".into()],
            tags: ["mountains".to_string(), "evening".to_string()].into(),
            ..art(1, "Blue Mountain Sunset", "Kim", "landscape")
        },
        CatalogItem {
            description: "Interlocking shapes in cobalt and white".into(),
            price: Some(800.0),
            year: Some(2015),
            colors: vec!["#1d4ed8".into(), "#ffffff".into()],
            ..art(2, "Abstract Blue Forms", "Lee", "abstract")
        },
        CatalogItem {
            description: "Fishing boats at anchor under a crimson sky".into(),
            price: Some(1100.0),
            year: Some(2001),
            colors: vec!["#1e40af".into(), "#ea580c".into(), "#fcd34d".into()],
            ..art(3, "Harbor at Dusk", "Kim", "landscape")
        },
        CatalogItem {
            description: "Portrait of a woman in a green shawl".into(),
            price: Some(5000.0),
            year: Some(1950),
            colors: vec!["#14532d".into(), "#a3a3a3".into()],
            ..art(4, "Lady in Green", "Moreau", "portrait")
        },
        CatalogItem {
            description: "Waves breaking on rocks, azure water".into(),
            price: Some(950.0),
            year: Some(2003),
            colors: vec!["#0ea5e9".into(), "#f1f5f9".into()],
            ..art(5, "Ocean Study", "Park", "seascape")
        },
    ];
    items.push(art(6, "Untitled", "", ""));
    items
}
