//! Multi-volume merging: generated bodies and converted folders.

use pagexml_oxide::config::ConversionConfig;
use pagexml_oxide::converters::header::{split_header, HEADER_END};
use pagexml_oxide::pipeline::{merge_volumes, BatchConverter, VolumeGroups};
use proptest::prelude::*;
use std::fs;

const HEADER: &str = "######OpenITI#\n\n#META# Creator: kraken\n\n\n#META#Header#End#\n\n";

fn body(words: &[String], volume: u32) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| format!("# {}\n~~{} %~% {}\n\nPageV{:02}P{:03}\n\n", word, word, word, volume, i + 1))
        .collect()
}

proptest! {
    #[test]
    fn prop_merge_keeps_bodies_and_renumbers_volumes(
        first in prop::collection::vec("[a-z]{1,8}", 1..6),
        second in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        // Both volumes were converted as volume 1
        let v1 = format!("{}{}", HEADER, body(&first, 1));
        let v2 = format!("{}{}", HEADER, body(&second, 1));

        let merged = merge_volumes(&[(2, v2), (1, v1)]).unwrap();
        prop_assert_eq!(merged.matches(HEADER_END).count(), 1);

        let (head, rest) = split_header(&merged).unwrap();
        prop_assert_eq!(format!("{}{}", head, HEADER_END), HEADER.trim_end_matches('\n'));
        let expected = format!("\n\n{}\n\n\n\n{}", body(&first, 1), body(&second, 2));
        prop_assert_eq!(rest, expected.as_str());
    }
}

fn page(text: &str) -> String {
    format!(
        r#"<PcGts xmlns="urn:page"><Metadata><Creator>kraken</Creator></Metadata><Page>
  <TextRegion custom="structure {{type:Main;}}"><Coords points="0,0 1000,0 1000,1000 0,1000"/>
    <TextLine><Coords points="100,50 900,50 900,90 100,90"/><TextEquiv><Unicode>{text}</Unicode></TextEquiv></TextLine>
  </TextRegion></Page></PcGts>"#
    )
}

#[test]
fn test_converted_volumes_merge() {
    let root = tempfile::tempdir().unwrap();
    let mut groups = VolumeGroups::new();
    for (volume, text) in [(1u32, "first volume"), (2, "second volume")] {
        let dir = root.path().join(format!("vol{}", volume));
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("p_1.xml"), page(text)).unwrap();

        let config = ConversionConfig::default()
            .with_image_names(false)
            .with_volume(volume);
        let converted = BatchConverter::new(config).unwrap().convert_folder(&dir).unwrap();
        groups.register("0845Maqrizi.Khitat", volume, converted.document.render());
    }
    groups.register("0900Other.Book", 1, format!("{}~~alone\n", HEADER));

    let merged = groups.finish().unwrap();
    assert_eq!(merged.len(), 1);
    let (book, text) = &merged[0];
    assert_eq!(book, "0845Maqrizi.Khitat");
    assert_eq!(
        text,
        &format!(
            "{}~~first volume\n\nPageV01P001\n\n\n\n\n\n~~second volume\n\nPageV02P001\n\n",
            HEADER
        )
    );
}
