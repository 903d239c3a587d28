mod common;

#[cfg(test)]
mod tests {
    use super::common::{
        docx_with_bibliography_bytes, fixture, pdf_with_xmp_bytes, pptx_bytes, txt_bytes, BIBLIOGRAPHY_XML, CONTENT,
        PASSWORD, USER, WRONG_PASSWORD,
    };

    use watermark_core::container::{xml, Container, ContainerKind};
    use watermark_core::engine::WatermarkEngine;
    use watermark_core::location::Carrier;
    use watermark_core::record::WatermarkRecord;
    use watermark_core::report::VerifyResponse;
    use watermark_core::types::WatermarkError;

    fn record() -> WatermarkRecord {
        WatermarkRecord::new(CONTENT, USER)
    }

    /// Embed into a fresh fixture and return the saved bytes.
    fn watermarked(kind: ContainerKind) -> Vec<u8> {
        let mut container = Container::from_bytes(kind, &fixture(kind)).unwrap();
        WatermarkEngine::default().embed_container(&mut container, &record(), PASSWORD).unwrap();
        container.to_bytes().unwrap()
    }

    fn location_names(kind: ContainerKind) -> Vec<&'static str> {
        match kind {
            ContainerKind::WordProcessing => vec!["style-rsid", "related-part", "custom-xml"],
            ContainerKind::Presentation => vec!["core-comments", "slide-layouts", "notes"],
            ContainerKind::Pdf => vec!["xmp-metadata", "catalog", "page-structure"],
            ContainerKind::PlainText => vec!["trailing-codeword", "leading-codeword"],
        }
    }

    /// Copy one location's value from `donor` into `target` through the adapter.
    fn transplant<C: Carrier>(target: &mut C, donor: &C, location: &str) {
        let loc = target.locations().into_iter().find(|l| l.name() == location).unwrap();
        let value = loc.read(donor).unwrap().unwrap();
        loc.write(target, &value).unwrap();
    }

    /// Watermarked fixture where `location` holds another record's valid payload.
    fn with_forged_location(kind: ContainerKind, location: &str) -> Container {
        let engine = WatermarkEngine::default();
        let mut target = Container::from_bytes(kind, &fixture(kind)).unwrap();
        let mut donor = Container::from_bytes(kind, &fixture(kind)).unwrap();
        engine.embed_container(&mut target, &record(), PASSWORD).unwrap();
        engine.embed_container(&mut donor, &WatermarkRecord::new("forged", "mallory"), PASSWORD).unwrap();

        match (&mut target, &donor) {
            (Container::Word(t), Container::Word(d)) => transplant(t, d, location),
            (Container::Presentation(t), Container::Presentation(d)) => transplant(t, d, location),
            (Container::Pdf(t), Container::Pdf(d)) => transplant(t, d, location),
            (Container::PlainText(t), Container::PlainText(d)) => transplant(t, d, location),
            _ => unreachable!(),
        }
        Container::from_bytes(kind, &target.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn every_kind_roundtrips_through_bytes() {
        let engine = WatermarkEngine::default();
        for kind in ContainerKind::ALL {
            let locations = location_names(kind);
            let mut container = Container::from_bytes(kind, &fixture(kind)).unwrap();
            let report = engine.embed_container(&mut container, &record(), PASSWORD).unwrap();
            assert_eq!(report.written, locations, "{kind}");
            assert!(report.failed.is_empty(), "{kind}: {:?}", report.failed);

            let reopened = Container::from_bytes(kind, &container.to_bytes().unwrap()).unwrap();
            let verified = engine.verify_container(&reopened, PASSWORD).unwrap();
            assert_eq!(verified.record, record(), "{kind}");
            assert_eq!(verified.meta.map(|m| m.kind), Some(kind));
        }
    }

    #[test]
    fn every_location_reads_back_after_save() {
        let engine = WatermarkEngine::default();
        for kind in ContainerKind::ALL {
            let reopened = Container::from_bytes(kind, &watermarked(kind)).unwrap();
            let report = match &reopened {
                Container::Word(d) => engine.extract_report(d).unwrap(),
                Container::Presentation(d) => engine.extract_report(d).unwrap(),
                Container::Pdf(d) => engine.extract_report(d).unwrap(),
                Container::PlainText(d) => engine.extract_report(d).unwrap(),
            };
            assert!(report.absent.is_empty(), "{kind}: absent {:?}", report.absent);
            assert!(report.failed.is_empty(), "{kind}: failed {:?}", report.failed);
            assert!(report.envelope.is_some());
        }
    }

    #[test]
    fn wrong_password_reports_decrypt_reason() {
        let engine = WatermarkEngine::default();
        for kind in ContainerKind::ALL {
            let container = Container::from_bytes(kind, &watermarked(kind)).unwrap();
            let resp = VerifyResponse::from(engine.verify_container(&container, WRONG_PASSWORD));
            assert!(!resp.success);
            assert_eq!(resp.message.as_deref(), Some(WatermarkError::Decrypt.to_string().as_str()), "{kind}");
        }
    }

    #[test]
    fn clean_documents_have_no_watermark() {
        let engine = WatermarkEngine::default();
        for kind in ContainerKind::ALL {
            let container = Container::from_bytes(kind, &fixture(kind)).unwrap();
            assert!(engine.extract_container(&container).unwrap().is_none(), "{kind}");
            assert!(matches!(engine.verify_container(&container, PASSWORD), Err(WatermarkError::NotFound)));
        }
    }

    #[test]
    fn plain_text_stays_visibly_identical() {
        let original = String::from_utf8(txt_bytes()).unwrap();
        let Container::PlainText(doc) = Container::from_bytes(ContainerKind::PlainText, &watermarked(ContainerKind::PlainText)).unwrap() else {
            unreachable!()
        };
        assert_ne!(doc.text(), original);
        assert_eq!(doc.visible_text(), original);
    }

    #[test]
    fn deck_without_notes_gets_a_notes_page() {
        let engine = WatermarkEngine::default();
        let mut container = Container::from_bytes(ContainerKind::Presentation, &pptx_bytes(false)).unwrap();
        let report = engine.embed_container(&mut container, &record(), PASSWORD).unwrap();
        assert_eq!(report.written, location_names(ContainerKind::Presentation));
        assert!(report.failed.is_empty(), "{:?}", report.failed);

        let reopened = Container::from_bytes(ContainerKind::Presentation, &container.to_bytes().unwrap()).unwrap();
        let Container::Presentation(deck) = &reopened else { unreachable!() };
        let pkg = deck.package();
        assert!(pkg.has_part("ppt/notesSlides/notesSlide1.xml"));
        assert!(pkg.has_part("ppt/notesMasters/notesMaster1.xml"));
        let types = pkg.xml("[Content_Types].xml").unwrap();
        assert!(types.contains("/ppt/notesSlides/notesSlide1.xml"));
        assert!(pkg.xml("ppt/presentation.xml").unwrap().contains("<p:notesMasterIdLst>"));

        let report = engine.extract_report(deck).unwrap();
        assert!(report.absent.is_empty(), "absent {:?}", report.absent);
        assert_eq!(engine.verify_container(&reopened, PASSWORD).unwrap().record, record());

        // a second embed reuses the created page
        let mut again = reopened.clone();
        engine.embed_container(&mut again, &record(), PASSWORD).unwrap();
        let Container::Presentation(deck) = &again else { unreachable!() };
        assert!(!deck.package().has_part("ppt/notesSlides/notesSlide2.xml"));
    }

    #[test]
    fn one_forged_location_is_a_consistency_error() {
        let engine = WatermarkEngine::default();
        for kind in ContainerKind::ALL {
            for location in location_names(kind) {
                let container = with_forged_location(kind, location);
                let r = engine.verify_container(&container, PASSWORD);
                assert!(
                    matches!(r, Err(WatermarkError::Consistency { distinct: 2 })),
                    "{kind}/{location}: {r:?}"
                );
            }
        }
    }

    #[test]
    fn edited_custom_xml_data_with_stale_hash_is_a_consistency_error() {
        let engine = WatermarkEngine::default();
        let forged = with_forged_location(ContainerKind::WordProcessing, "related-part");
        let Container::Word(forged) = forged else { unreachable!() };
        let other_payload = forged
            .locations()
            .into_iter()
            .find(|l| l.name() == "related-part")
            .unwrap()
            .read(&forged)
            .unwrap()
            .unwrap();

        let mut container = Container::from_bytes(ContainerKind::WordProcessing, &watermarked(ContainerKind::WordProcessing)).unwrap();
        let Container::Word(doc) = &mut container else { unreachable!() };
        let part = doc
            .package()
            .part_names()
            .find(|n| n.starts_with("customXml/") && doc.package().xml(n).unwrap().contains("<watermark:settings"))
            .unwrap()
            .to_string();
        let body = doc.package().xml(&part).unwrap();
        let edited = xml::set_element_text(&body, "watermark:data", &other_payload).unwrap();
        assert_eq!(xml::element_text(&edited, "watermark:hash"), xml::element_text(&body, "watermark:hash"));
        doc.package_mut().set_xml(&part, edited);

        let r = engine.verify_container(&container, PASSWORD);
        assert!(matches!(r, Err(WatermarkError::Consistency { distinct: 2 })), "{r:?}");
    }

    #[test]
    fn existing_custom_xml_parts_are_left_alone() {
        let engine = WatermarkEngine::default();
        let mut container = Container::from_bytes(ContainerKind::WordProcessing, &docx_with_bibliography_bytes()).unwrap();
        let report = engine.embed_container(&mut container, &record(), PASSWORD).unwrap();
        assert!(report.failed.is_empty(), "{:?}", report.failed);

        let reopened = Container::from_bytes(ContainerKind::WordProcessing, &container.to_bytes().unwrap()).unwrap();
        let Container::Word(doc) = &reopened else { unreachable!() };
        assert_eq!(doc.package().xml("customXml/item1.xml").unwrap(), BIBLIOGRAPHY_XML);
        assert_eq!(engine.verify_container(&reopened, PASSWORD).unwrap().record, record());

        let mut again = reopened.clone();
        engine.embed_container(&mut again, &record(), PASSWORD).unwrap();
        let Container::Word(doc) = &again else { unreachable!() };
        let custom: Vec<&str> = doc.package().part_names().filter(|n| n.starts_with("customXml/")).collect();
        assert_eq!(custom.len(), 3, "{custom:?}");
        assert_eq!(doc.package().xml("customXml/item1.xml").unwrap(), BIBLIOGRAPHY_XML);
        assert_eq!(engine.verify_container(&again, PASSWORD).unwrap().record, record());
    }

    #[test]
    fn existing_xmp_properties_survive_embedding() {
        let engine = WatermarkEngine::default();
        let mut container = Container::from_bytes(ContainerKind::Pdf, &pdf_with_xmp_bytes()).unwrap();
        engine.embed_container(&mut container, &record(), PASSWORD).unwrap();

        let reopened = Container::from_bytes(ContainerKind::Pdf, &container.to_bytes().unwrap()).unwrap();
        let Container::Pdf(pdf) = &reopened else { unreachable!() };
        let doc = pdf.document();
        let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let meta = doc.get_object(root).unwrap().as_dict().unwrap().get(b"Metadata").unwrap().as_reference().unwrap();
        let xmp = String::from_utf8(doc.get_object(meta).unwrap().as_stream().unwrap().content.clone()).unwrap();

        assert!(xmp.contains("<rdf:li xml:lang='x-default'>Annual Report</rdf:li>"), "{xmp}");
        assert!(xmp.contains("<xmp:CreatorTool>Writer</xmp:CreatorTool>"));
        assert!(xmp.contains("<dc:description>"));
        let report = engine.extract_report(pdf).unwrap();
        assert!(report.absent.is_empty(), "absent {:?}", report.absent);
        assert_eq!(engine.verify_container(&reopened, PASSWORD).unwrap().record, record());
    }

    #[test]
    fn text_with_joiners_keeps_its_visible_content() {
        let engine = WatermarkEngine::default();
        let host = "Family: \u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\n\u{0645}\u{06CC}\u{200C}\u{062E}\u{0648}\u{0627}\u{0647}\u{0645}\n";
        let mut container = Container::from_bytes(ContainerKind::PlainText, host.as_bytes()).unwrap();
        engine.embed_container(&mut container, &record(), PASSWORD).unwrap();

        let reopened = Container::from_bytes(ContainerKind::PlainText, &container.to_bytes().unwrap()).unwrap();
        let Container::PlainText(doc) = &reopened else { unreachable!() };
        assert_eq!(doc.visible_text(), host);
        assert_eq!(engine.verify_container(&reopened, PASSWORD).unwrap().record, record());
    }

    #[test]
    fn file_roundtrip_and_response_shape() {
        let dir = tempfile::tempdir().unwrap();
        let engine = WatermarkEngine::default();

        for kind in ContainerKind::ALL {
            let input = dir.path().join(format!("input.{}", kind.extension()));
            let output = dir.path().join(format!("output.{}", kind.extension()));
            let original = fixture(kind);
            std::fs::write(&input, &original).unwrap();

            engine.embed_file(&input, &output, &record(), PASSWORD).unwrap();
            assert_eq!(std::fs::read(&input).unwrap(), original, "{kind}: input modified");

            let resp = VerifyResponse::from(engine.verify_file(&output, PASSWORD));
            let v = serde_json::to_value(&resp).unwrap();
            assert_eq!(v["success"], true, "{kind}");
            assert_eq!(v["watermark"]["content"], CONTENT);
            assert_eq!(v["watermark"]["user"], USER);
        }
    }

    #[test]
    fn unsupported_extension_is_rejected_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.ppt");
        std::fs::write(&path, b"irrelevant").unwrap();
        let r = WatermarkEngine::default().verify_file(&path, PASSWORD);
        assert!(matches!(r, Err(WatermarkError::UnsupportedKind(_))));
    }

    #[test]
    fn corrupt_package_is_an_adapter_error() {
        for kind in [ContainerKind::WordProcessing, ContainerKind::Presentation, ContainerKind::Pdf] {
            let err = Container::from_bytes(kind, b"definitely not a document").unwrap_err();
            assert_eq!(err.kind, kind);
        }
    }
}
