//! Property tests for title cleanup, image substitution and markup stripping.

use proptest::prelude::*;
use vsi::NavStrip;
use vsi::convert::{ImageReference, clean_title, strip_markup, substitute_images};

fn chapter_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,10}( [A-Za-z]{1,10}){0,4}"
}

fn markup_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{0,12}".prop_map(|t| format!("<p>{t}</p>")),
        "[a-z]{1,8}".prop_map(|t| format!(r#"<ul class="div1-nav"><li>{t}</li></ul>"#)),
        "[a-z]{1,8}".prop_map(|t| format!("<ul><li>{t}</li></ul>")),
        (0u32..500).prop_map(|n| format!(r#"<span id="p{n}" class="printPage">p. {n}</span>"#)),
        (0u32..500).prop_map(|n| format!(r#"<span title="m{n}" class="printPageMark">↵</span>"#)),
        Just(r#"<span title="m" class="printPageMark">â†µ</span>"#.to_string()),
    ]
}

proptest! {
    #[test]
    fn prop_page_and_number_prefix_removed(page in 0u32..10_000, name in chapter_name()) {
        let raw = format!("p. {page}. {name}");
        prop_assert_eq!(clean_title(&raw), name);
    }

    #[test]
    fn prop_glued_page_prefix_removed(page in 0u32..10_000, word in "[A-Za-z]{1,16}") {
        let raw = format!("p. {page}{word}");
        prop_assert_eq!(clean_title(&raw), word);
    }

    #[test]
    fn prop_no_images_leaves_body_unchanged(body in "[ -~]{0,200}") {
        prop_assert_eq!(substitute_images(&body, &[]).unwrap(), body);
    }

    #[test]
    fn prop_every_image_source_replaced(
        names in prop::collection::hash_set("[a-z]{2,8}", 1..6),
        text in "[a-zA-Z ]{0,20}",
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let body: String = names
            .iter()
            .map(|n| format!(r#"<p>{text}</p><img src="ch1_files/{n}.png"/>"#))
            .collect();
        let images: Vec<ImageReference> = names
            .iter()
            .map(|n| ImageReference {
                original: format!("ch1_files/{n}.png"),
                asset: format!("../images/{n}.png"),
            })
            .collect();

        let out = substitute_images(&body, &images).unwrap();

        for image in &images {
            prop_assert!(!out.contains(&image.original));
            prop_assert_eq!(out.matches(&image.asset).count(), 1);
        }
    }

    #[test]
    fn prop_strip_is_idempotent(
        fragments in prop::collection::vec(markup_fragment(), 0..12),
        lazy in any::<bool>(),
    ) {
        let mode = if lazy { NavStrip::Lazy } else { NavStrip::Greedy };
        let html = fragments.concat();

        let once = strip_markup(&html, mode);
        let twice = strip_markup(&once, mode);
        prop_assert_eq!(&twice, &once);
        prop_assert!(!once.contains("printPage"));
    }
}
