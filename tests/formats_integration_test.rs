use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::Write;
use tableprep::core::parser;
use tableprep::core::{format, Pipeline};
use tableprep::domain::model::FileFormat;
use tableprep::{FileInput, LocalStorage, PrepPipeline};
use zip::write::{FileOptions, ZipWriter};

struct NoExportConfig;

impl tableprep::core::ConfigProvider for NoExportConfig {
    fn output_path(&self) -> &str {
        "unused"
    }
    fn concurrent_files(&self) -> usize {
        1
    }
    fn sample_rows(&self) -> usize {
        10
    }
    fn apply_plan(&self) -> bool {
        false
    }
}

fn pipeline() -> PrepPipeline<LocalStorage, NoExportConfig> {
    PrepPipeline::new(LocalStorage::new("unused"), NoExportConfig)
}

#[tokio::test]
async fn test_extract_csv_round_trip() -> Result<()> {
    let input = FileInput::new("t.csv", "text/csv", b"a,b\n1,2\n3,4\n".to_vec());
    let table = pipeline().extract(&input).await?;

    assert_eq!(table.fields, vec!["a", "b"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.records[0].get("a"), Some(&Value::String("1".into())));
    assert_eq!(table.records[1].get("b"), Some(&Value::String("4".into())));
    Ok(())
}

#[tokio::test]
async fn test_extract_each_text_format() -> Result<()> {
    let pipeline = pipeline();

    let cases: Vec<(&str, &str, Vec<u8>)> = vec![
        ("t.tsv", "", b"a\tb\n1\t2\n".to_vec()),
        ("t.json", "", br#"[{"a": 1}, {"a": 2}]"#.to_vec()),
        ("t.yaml", "", b"- a: 1\n- a: 2\n".to_vec()),
        ("t.toml", "", b"[[rows]]\na = 1\n[[rows]]\na = 2\n".to_vec()),
        (
            "t.xml",
            "",
            b"<d><r><a>1</a></r><r><a>2</a></r></d>".to_vec(),
        ),
        ("t.log", "", b"2023-01-01 10:00:00 INFO up\nINFO still up\n".to_vec()),
    ];

    for (name, mime, bytes) in cases {
        let table = pipeline
            .extract(&FileInput::new(name, mime, bytes))
            .await
            .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
        assert_eq!(table.row_count(), 2, "rows of {}", name);
    }
    Ok(())
}

#[tokio::test]
async fn test_extract_gzip_re_dispatches() -> Result<()> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"a,b\n1,2\n3,4\n")?;
    let compressed = encoder.finish()?;

    let table = pipeline()
        .extract(&FileInput::new("t.csv.gz", "", compressed))
        .await?;
    assert_eq!(table.fields, vec!["a", "b"]);
    assert_eq!(table.row_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_extract_zip_picks_supported_entry() -> Result<()> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer.start_file::<_, ()>("ignore.bin", FileOptions::default())?;
    writer.write_all(b"junk")?;
    writer.start_file::<_, ()>("rows.json", FileOptions::default())?;
    writer.write_all(br#"[{"v": 1}, {"v": 2}, {"v": 3}]"#)?;
    let bytes = writer.finish()?.into_inner();

    let table = pipeline()
        .extract(&FileInput::new("bundle.zip", "", bytes))
        .await?;
    assert_eq!(table.fields, vec!["v"]);
    assert_eq!(table.row_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_detector_and_dispatcher_agree() {
    // Every dispatchable tag detected from an extension must parse or fail
    // with a format-specific error, never an unsupported-format error.
    let format = format::detect("data.yaml", "");
    assert_eq!(format, FileFormat::Yaml);
    let err = parser::parse_file(format, &FileInput::new("data.yaml", "", b": : :".to_vec()))
        .unwrap_err();
    assert!(matches!(
        err,
        tableprep::PrepError::Parse { ref format, .. } if format == "yaml"
    ));
}
