use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::CliTest;

const ELEMENT_A: &str = r#"
import { LitElement } from 'lit';
import { customElement, property } from 'lit/decorators.js';

@customElement('a-x')
export class A extends LitElement {
  @property({ type: Boolean }) open: boolean = false;
}
"#;

#[test]
fn test_tagged_element_with_boolean_attribute() -> Result<()> {
    let test = CliTest::with_file("src/a.ts", ELEMENT_A)?;

    let manifest = test.generate_manifest()?;

    insta::assert_snapshot!(manifest["schemaVersion"].as_str().unwrap(), @"2.1.0");

    let module = &manifest["modules"][0];
    assert_eq!(module["kind"], "javascript-module");
    assert_eq!(module["path"], "src/a.js");

    let class = &module["declarations"][0];
    assert_eq!(class["kind"], "class");
    assert_eq!(class["name"], "A");
    assert_eq!(class["customElement"], true);
    assert_eq!(class["tagName"], "a-x");

    let attribute = &class["attributes"][0];
    assert_eq!(attribute["name"], "open");
    assert_eq!(attribute["type"]["text"], "boolean");
    assert_eq!(attribute["default"], "false");
    assert_eq!(attribute["fieldName"], "open");

    let exports = module["exports"].as_array().unwrap();
    assert_eq!(exports.len(), 2);
    assert_eq!(exports[0]["kind"], "custom-element-definition");
    assert_eq!(exports[0]["name"], "a-x");
    assert_eq!(exports[0]["declaration"]["module"], "src/a.js");
    assert_eq!(exports[0]["declaration"]["name"], "A");
    assert_eq!(exports[1]["kind"], "js");
    assert_eq!(exports[1]["name"], "A");

    Ok(())
}

#[test]
fn test_type_alias_expansion() -> Result<()> {
    let test = CliTest::with_file(
        "src/b.ts",
        r#"
import { customElement, property } from 'lit/decorators.js';

type T = 'a' | 'b' | 'c';

@customElement('b-y')
export class B extends HTMLElement {
  @property() kind: T = 'a';
}
"#,
    )?;

    let manifest = test.generate_manifest()?;
    let class = &manifest["modules"][0]["declarations"][0];
    let attribute_type = &class["attributes"][0]["type"];

    insta::assert_snapshot!(attribute_type["text"].as_str().unwrap(), @"'a' | 'b' | 'c'");
    assert_eq!(attribute_type["references"][0]["name"], "T");
    assert_eq!(attribute_type["references"][0]["module"], "src/b.js");

    Ok(())
}

#[test]
fn test_slot_yaml_comment() -> Result<()> {
    let test = CliTest::with_file(
        "src/card.ts",
        r#"
import { customElement } from 'lit/decorators.js';

@customElement('x-card')
export class Card extends HTMLElement {
  render() {
    return html`<!-- summary: main --><slot></slot>`;
  }
}
"#,
    )?;

    let manifest = test.generate_manifest()?;
    let slots = manifest["modules"][0]["declarations"][0]["slots"]
        .as_array()
        .unwrap();

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["summary"], "main");
    // The default slot has no name key at all.
    assert!(slots[0].get("name").is_none());

    Ok(())
}

#[test]
fn test_private_css_property_ignored() -> Result<()> {
    let test = CliTest::with_file(
        "src/a.ts",
        r#"
import { customElement } from 'lit/decorators.js';

@customElement('a-x')
export class A extends HTMLElement {
  static styles = css`:host { color: var(--_internal); }`;
}
"#,
    )?;

    let manifest = test.generate_manifest()?;
    let class = &manifest["modules"][0]["declarations"][0];
    assert!(class.get("cssProperties").is_none());

    Ok(())
}

#[test]
fn test_manifest_written_to_file() -> Result<()> {
    let test = CliTest::with_file("src/a.ts", ELEMENT_A)?;

    let output = test.command().arg("generate").output()?;
    assert!(output.status.success());

    let written = test.read_file("custom-elements.json")?;
    let manifest: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(manifest["modules"][0]["path"], "src/a.js");

    Ok(())
}

#[test]
fn test_generation_is_deterministic() -> Result<()> {
    let test = CliTest::with_file("src/a.ts", ELEMENT_A)?;
    test.write_file("src/b.ts", "export const VERSION: string = '1';\n")?;

    let first = test.generate_to_stdout()?;
    let second = test.generate_to_stdout()?;

    assert_eq!(first.stdout, second.stdout);

    Ok(())
}

#[test]
fn test_modules_sorted_by_path() -> Result<()> {
    let test = CliTest::with_file("src/z.ts", "export const Z: number = 1;\n")?;
    test.write_file("src/a.ts", "export const A: number = 1;\n")?;
    test.write_file("src/m.ts", "export const M: number = 1;\n")?;

    let manifest = test.generate_manifest()?;
    let paths: Vec<&str> = manifest["modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["path"].as_str().unwrap())
        .collect();

    assert_eq!(paths, vec!["src/a.js", "src/m.js", "src/z.js"]);

    Ok(())
}

#[test]
fn test_config_file_excludes() -> Result<()> {
    let test = CliTest::with_file("src/a.ts", ELEMENT_A)?;
    test.write_file("src/a.stories.ts", "export const S: number = 1;\n")?;
    test.write_file(
        ".cemgenrc.json",
        r#"{ "exclude": ["**/*.stories.ts"] }"#,
    )?;

    let manifest = test.generate_manifest()?;
    let modules = manifest["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0]["path"], "src/a.js");

    Ok(())
}

#[test]
fn test_declaration_files_excluded_by_default() -> Result<()> {
    let test = CliTest::with_file("src/a.ts", ELEMENT_A)?;
    test.write_file(
        "src/a.d.ts",
        "export declare class A extends HTMLElement {}\n",
    )?;

    let manifest = test.generate_manifest()?;
    assert_eq!(manifest["modules"].as_array().unwrap().len(), 1);

    Ok(())
}

#[test]
fn test_parse_error_still_produces_manifest() -> Result<()> {
    let test = CliTest::with_file("src/bad.ts", "export class Broken extends {")?;
    test.write_file("src/a.ts", ELEMENT_A)?;

    let output = test.generate_to_stdout()?;
    // Diagnostics go to stderr; the manifest still lands on stdout.
    let stdout = String::from_utf8(output.stdout)?;
    let manifest: serde_json::Value = serde_json::from_str(&stdout)?;
    assert!(
        manifest["modules"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m["path"] == "src/a.js")
    );

    Ok(())
}

#[test]
fn test_design_tokens_enrich_css_properties() -> Result<()> {
    let test = CliTest::with_file(
        "src/a.ts",
        r#"
import { customElement } from 'lit/decorators.js';

@customElement('a-x')
export class A extends HTMLElement {
  static styles = css`:host { color: var(--color-primary); }`;
}
"#,
    )?;
    test.write_file(
        "tokens.json",
        r##"{
            "color": {
                "primary": {
                    "$type": "color",
                    "$value": "#0066cc",
                    "$description": "Brand primary color"
                }
            }
        }"##,
    )?;
    test.write_file(
        ".cemgenrc.json",
        r#"{ "designTokens": { "spec": "tokens.json" } }"#,
    )?;

    let manifest = test.generate_manifest()?;
    let property = &manifest["modules"][0]["declarations"][0]["cssProperties"][0];

    assert_eq!(property["name"], "--color-primary");
    assert_eq!(property["syntax"], "<color>");
    assert_eq!(property["default"], "#0066cc");
    assert_eq!(property["description"], "Brand primary color");

    Ok(())
}

#[test]
fn test_help() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("--help").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("generate"));
    assert!(stdout.contains("init"));

    Ok(())
}
