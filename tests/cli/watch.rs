use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::CliTest;

/// Poll until the condition holds or the timeout elapses.
fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn test_watch_regenerates_on_change() -> Result<()> {
    let test = CliTest::with_file(
        "src/a.ts",
        r#"
import { customElement, property } from 'lit/decorators.js';

@customElement('a-x')
export class A extends HTMLElement {
  @property() label: string = '';
}
"#,
    )?;

    let mut child = test
        .command()
        .args(["generate", "--watch"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    // The initial build writes the manifest before watching starts.
    assert!(
        wait_until(Duration::from_secs(20), || {
            test.read_file("custom-elements.json").is_ok()
        }),
        "initial manifest was never written"
    );

    // A burst of edits must coalesce into a rebuild that lands on disk.
    for _ in 0..5 {
        test.write_file(
            "src/a.ts",
            r#"
import { customElement, property } from 'lit/decorators.js';

@customElement('a-x')
export class A extends HTMLElement {
  @property() label: string = '';
  @property({ type: Boolean }) open: boolean = false;
}
"#,
        )?;
        std::thread::sleep(Duration::from_millis(10));
    }

    let updated = wait_until(Duration::from_secs(20), || {
        test.read_file("custom-elements.json")
            .map(|content| content.contains("\"open\""))
            .unwrap_or(false)
    });

    child.kill()?;
    child.wait()?;

    assert!(updated, "watch session never published the edited manifest");

    Ok(())
}
