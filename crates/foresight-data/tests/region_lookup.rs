//! Region lookup against raw ZHVI tables.

use foresight_data::{DataError, extract_region_series, parse_table};
use rstest::rstest;

const INTEGER_CODES: &str = "\
RegionID,RegionName,City,2023-11-30,2023-12-31,2024-01-31
1,10025,New York,1190000.0,1195000.0,1200000.0
2,8901,New Brunswick,395000.0,398000.0,400000.0
3,60614,Chicago,610000.0,,615000.0
";

const STRING_CODES: &str = "\
RegionID,RegionName,City,2023-11-30,2023-12-31,2024-01-31
1,10025,New York,1190000.0,1195000.0,1200000.0
2,8901,New Brunswick,395000.0,398000.0,400000.0
3,ZZ-1,Nowhere,1.0,2.0,3.0
";

#[rstest]
#[case::integer_keys(INTEGER_CODES)]
#[case::string_keys(STRING_CODES)]
fn test_leading_zero_code_matches(#[case] raw: &str) {
    let table = parse_table(raw.as_bytes()).unwrap();
    let series = extract_region_series(&table, "08901").unwrap();
    assert_eq!(series.values(), &[395000.0, 398000.0, 400000.0]);
}

#[rstest]
#[case("8901")]
#[case("08901")]
#[case("008901")]
fn test_code_spellings(#[case] code: &str) {
    let table = parse_table(INTEGER_CODES.as_bytes()).unwrap();
    assert!(extract_region_series(&table, code).is_ok());
}

#[test]
fn test_dates_are_month_ends_in_order() {
    let table = parse_table(INTEGER_CODES.as_bytes()).unwrap();
    let series = extract_region_series(&table, "60614").unwrap();
    let dates: Vec<String> = series.dates().iter().map(|d| d.to_string()).collect();
    assert_eq!(dates, vec!["2023-11-30", "2024-01-31"]);
}

#[test]
fn test_absent_code_lists_samples() {
    let table = parse_table(INTEGER_CODES.as_bytes()).unwrap();
    let err = extract_region_series(&table, "99999").unwrap_err();
    match &err {
        DataError::RegionNotFound { region, samples } => {
            assert_eq!(region, "99999");
            assert_eq!(samples, &["10025", "8901", "60614"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("10025, 8901, 60614"));
}
