use anyhow::Result;

use crate::CliTest;

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;
    assert!(output.status.success());

    let config = test.read_file(".cemgenrc.json")?;
    let parsed: serde_json::Value = serde_json::from_str(&config)?;
    assert!(parsed["files"].is_array());
    assert_eq!(parsed["output"], "custom-elements.json");

    Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
    let test = CliTest::with_file(".cemgenrc.json", "{}")?;

    let output = test.command().arg("init").output()?;
    assert!(!output.status.success());
    assert_eq!(test.read_file(".cemgenrc.json")?, "{}");

    Ok(())
}
