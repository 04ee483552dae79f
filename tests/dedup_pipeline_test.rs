use anyhow::Result;
use std::fs;
use store_dedup::app::dedup_use_case::{preview_dedup, run_dedup, DedupSettings};
use store_dedup::infra::csv_table_adapter::parse_csv;
use store_dedup::DedupError;
use tempfile::tempdir;

const BOM: &str = "\u{feff}";

#[test]
fn test_end_to_end_keeps_first_of_duplicate_addresses() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("matched_stores.csv");
    let output = temp_dir.path().join("matched_stores_unique.csv");

    fs::write(
        &input,
        format!(
            "{BOM}이름,주소,출처,매칭이유\n\
             GS25 당산점,서울특별시 영등포구 당산로 1,kakao,1차매칭\n\
             GS25-당산점,서울 영등포구 당산로 1,seoul_license,2차검증\n\
             세븐일레븐 선유점,서울 영등포구 선유로 10,kakao,1차매칭\n"
        ),
    )?;

    let report = run_dedup(&input, &output, &DedupSettings::default())?;

    assert_eq!(report.before.total_rows, 3);
    assert_eq!(report.before.duplicate_address_rows, 2);
    assert_eq!(report.before.duplicate_name_rows, 2);
    assert_eq!(report.before.secondary_only.len(), 1);
    assert_eq!(report.after.total_rows, 2);
    assert!(report.input_sha256.is_some());

    let bytes = fs::read(&output)?;
    assert!(bytes.starts_with(BOM.as_bytes()));

    let written = parse_csv(&bytes)?;
    assert_eq!(
        written.headers,
        vec!["이름", "주소", "출처", "매칭이유", "이름_정규화", "주소_정규화"]
    );
    assert_eq!(written.rows.len(), 2);
    assert_eq!(written.rows[0][0], "GS25 당산점");
    assert_eq!(written.rows[0][4], "gs25당산점");
    assert_eq!(written.rows[0][5], "서울 영등포구 당산로 1");
    assert_eq!(written.rows[1][0], "세븐일레븐 선유점");

    // Input untouched
    assert!(fs::read_to_string(&input)?.contains("GS25-당산점"));

    Ok(())
}

#[test]
fn test_rerunning_on_output_changes_nothing() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("in.csv");
    let first = temp_dir.path().join("first.csv");
    let second = temp_dir.path().join("second.csv");

    fs::write(
        &input,
        "이름,주소,주소_정규화,출처,매칭이유\n\
         CU,서울 영등포구 당산로 1,서울 영등포구 당산로 1,kakao,1차매칭\n\
         CU2,서울시 영등포구 당산로 1,서울 영등포구 당산로 1,kakao,1차매칭\n\
         이마트24,서울 영등포구 양평로 5,서울 영등포구 양평로 5,naver,1차매칭\n",
    )?;

    let once = run_dedup(&input, &first, &DedupSettings::default())?;
    let twice = run_dedup(&first, &second, &DedupSettings::default())?;

    assert_eq!(once.after.total_rows, 2);
    assert_eq!(twice.before.total_rows, 2);
    assert_eq!(twice.after.removed_rows, 0);
    assert_eq!(parse_csv(&fs::read(&first)?)?.rows, parse_csv(&fs::read(&second)?)?.rows);

    Ok(())
}

#[test]
fn test_missing_required_column_is_fatal() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("broken.csv");
    let output = temp_dir.path().join("out.csv");
    fs::write(&input, "이름,주소\nCU,서울 영등포구 당산로 1\n")?;

    let result = run_dedup(&input, &output, &DedupSettings::default());

    match result {
        Err(DedupError::MissingColumns(columns)) => {
            assert_eq!(columns, vec!["출처".to_string(), "매칭이유".to_string()]);
        }
        other => panic!("expected missing columns, got {:?}", other.map(|r| r.after)),
    }
    assert!(!output.exists());

    Ok(())
}

#[test]
fn test_missing_input_is_fatal() {
    let temp_dir = tempdir().unwrap();
    let result = preview_dedup(&temp_dir.path().join("nope.csv"), &DedupSettings::default());
    assert!(matches!(result, Err(DedupError::InputNotFound(_))));
}

#[test]
fn test_preview_reports_closure_and_coordinates() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("closure.csv");
    fs::write(
        &input,
        "이름,주소,출처,매칭이유,상태,위도,경도\n\
         정상 매장,서울 영등포구 당산로 1,kakao,1차매칭,정상,37.5171,126.9066\n\
         폐업 매장,서울 영등포구 당산로 2,kakao,1차매칭,폐업,37.5175,126.9070\n\
         먼 매장,서울 영등포구 당산로 3,kakao,1차매칭,정상,35.1796,129.0756\n",
    )?;

    let report = preview_dedup(&input, &DedupSettings::default())?;

    let closure = report.before.closure.as_ref().expect("status column present");
    assert_eq!(closure.open, 2);
    assert_eq!(closure.closed, 1);

    let coordinates = report.before.coordinates.as_ref().expect("coordinate columns present");
    assert_eq!(coordinates.outside_seoul.len(), 1);
    assert!(report.output.is_none());

    Ok(())
}
