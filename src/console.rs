use std::io::{self, BufRead, Write};

use crate::{config::AppConfig, error::StoreError, store::LinkStore, url::with_scheme};

const MENU: &str = "\
=== URL Shortener ===
1. Create short link
2. Follow short link
3. List all links
4. Link info
5. Delete link
6. Quit";

/// Interactive numbered menu over `store`. Returns when the user quits or
/// `input` reaches end of file.
pub fn run<R: BufRead, W: Write>(
    store: &LinkStore,
    config: &AppConfig,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    loop {
        writeln!(output, "\n{MENU}")?;

        let Some(choice) = prompt(&mut input, &mut output, "\nChoose an action: ")? else {
            break;
        };

        match choice.as_str() {
            "1" => {
                let Some(long_url) = prompt(&mut input, &mut output, "Enter a long URL: ")? else {
                    break;
                };
                let Some(custom_code) = prompt(
                    &mut input,
                    &mut output,
                    "Enter a custom code (leave empty to generate one): ",
                )?
                else {
                    break;
                };

                let long_url = with_scheme(&long_url);
                match store.shorten(&long_url, Some(custom_code.as_str())) {
                    Ok(code) => {
                        writeln!(output, "Short link created: {}", config.short_url(&code))?
                    }
                    Err(e) => report(&mut output, &e)?,
                }
            }
            "2" => {
                let Some(code) = prompt(&mut input, &mut output, "Enter a short code: ")? else {
                    break;
                };
                match store.resolve(&code) {
                    Ok(Some(long_url)) => writeln!(output, "Redirecting to: {long_url}")?,
                    Ok(None) => writeln!(output, "Link not found")?,
                    Err(e) => report(&mut output, &e)?,
                }
            }
            "3" => {
                let links = store.list();
                if links.is_empty() {
                    writeln!(output, "No saved links")?;
                } else {
                    writeln!(output, "\nAll saved links:")?;
                    for link in links {
                        writeln!(
                            output,
                            "{} -> {} (clicks: {})",
                            link.short_code, link.record.long_url, link.record.clicks
                        )?;
                    }
                }
            }
            "4" => {
                let Some(code) = prompt(&mut input, &mut output, "Enter a short code: ")? else {
                    break;
                };
                match store.info(&code) {
                    Some(record) => {
                        writeln!(output, "Original URL: {}", record.long_url)?;
                        writeln!(
                            output,
                            "Created: {}",
                            record.created_at.format("%Y-%m-%d %H:%M:%S")
                        )?;
                        writeln!(output, "Clicks: {}", record.clicks)?;
                    }
                    None => writeln!(output, "Link not found")?,
                }
            }
            "5" => {
                let Some(code) =
                    prompt(&mut input, &mut output, "Enter the short code to delete: ")?
                else {
                    break;
                };
                match store.delete(&code) {
                    Ok(true) => writeln!(output, "Link deleted")?,
                    Ok(false) => writeln!(output, "Link not found")?,
                    Err(e) => report(&mut output, &e)?,
                }
            }
            "6" => {
                writeln!(output, "Goodbye!")?;
                break;
            }
            _ => writeln!(output, "Invalid choice")?,
        }
    }

    Ok(())
}

/// Print `label`, then read one trimmed line. `None` on end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

fn report<W: Write>(output: &mut W, err: &StoreError) -> io::Result<()> {
    if !matches!(err, StoreError::DuplicateCode(_)) {
        tracing::error!("Store operation failed: {err}");
    }
    writeln!(output, "Error: {err}")
}
