#![no_main]

use libfuzzer_sys::fuzz_target;
use slidefence_core::{ElementDescriptor, ElementTree, SelectorList};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 1024 {
        return;
    }

    // Parsing must never panic.
    let Ok(list) = SelectorList::parse(text) else {
        return;
    };

    // A parsed list re-parses from its own rendering.
    let rendered = list.to_string();
    assert!(
        SelectorList::parse(&rendered).is_ok(),
        "rendered selector failed to re-parse: {rendered:?}"
    );

    // Matching must never panic, on any element of a small tree.
    let mut tree = ElementTree::new();
    let section = tree.push(None, ElementDescriptor::new("section").with_id("intro"));
    let heading = tree.push(Some(section), ElementDescriptor::new("h2"));
    let notes = tree.push(
        Some(section),
        ElementDescriptor::new("aside")
            .with_class("notes")
            .with_attribute("data-state", "open"),
    );
    let item = tree.push(Some(notes), ElementDescriptor::new("li").with_class("item"));
    let tail = tree.push(Some(section), ElementDescriptor::new("p"));
    for ix in [section, heading, notes, item, tail] {
        if let Some(element) = tree.element(ix) {
            let _ = list.matches(&element);
            let _ = list.matches_self_or_ancestor(&element);
        }
    }
});
