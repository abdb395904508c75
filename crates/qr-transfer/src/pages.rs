use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::i18n::{Lang, Translator};

/// Pre-filled data when no URL prefix is configured.
pub const FALLBACK_DATA: &str = "https://qrtr.syaryn.com/";

const HOME_SCRIPT: &str = include_str!("../assets/home.js");
const READER_SCRIPT: &str = include_str!("../assets/reader.js");

const PICO_CSS: &str = "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
const HTMX_JS: &str = "https://cdn.jsdelivr.net/npm/htmx.org@1.9.12/dist/htmx.min.js";
const ALPINE_JS: &str = "https://cdn.jsdelivr.net/npm/alpinejs@3.x.x/dist/cdn.min.js";

struct PageText {
    title: String,
    description: String,
    trademark: String,
}

impl PageText {
    fn load(translator: &Translator, lang: Lang, page: &str) -> Self {
        let t = |key: &str| translator.t(lang, &format!("{page}.{key}")).to_owned();
        Self {
            title: t("title"),
            description: t("description"),
            trademark: t("trademark"),
        }
    }
}

/// Encode a string as a JSON literal safe to inline inside a `<script>` block.
pub fn script_string(text: &str) -> String {
    serde_json::Value::from(text)
        .to_string()
        .replace("</", "<\\/")
}

/// Strings the client scripts need, keyed by the names they use.
fn messages_script(translator: &Translator, lang: Lang) -> String {
    let entries = [
        ("copied", "copied"),
        ("permissionDenied", "camera.permissionDenied"),
        ("httpsRequired", "camera.httpsRequired"),
        ("genericError", "camera.genericError"),
        ("environment", "camera.environment"),
        ("user", "camera.user"),
    ]
    .iter()
    .map(|(name, key)| format!("{name}: {}", script_string(translator.t(lang, key))))
    .collect::<Vec<_>>()
    .join(", ");
    format!("window.__messages = {{ {entries} }};")
}

fn layout(translator: &Translator, lang: Lang, text: &PageText, body: Markup, script: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(lang.code()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (&text.title) }
                meta name="description" content=(&text.description);
                link rel="stylesheet" href=(PICO_CSS);
                link rel="icon" href="/logo.svg" type="image/svg+xml";
                script src=(HTMX_JS) defer {}
                script src=(ALPINE_JS) defer {}
            }
            body {
                main.container { (body) }
                footer style="text-align:center;" { (&text.trademark) }
                // Inline scripts run before the deferred Alpine bundle starts.
                script { (PreEscaped(format!("{}\n{script}", messages_script(translator, lang)))) }
            }
        }
    }
}

fn header(text: &PageText) -> Markup {
    html! {
        header {
            img src="/logo.svg" alt=(&text.title) width="96" height="96" style="display:block;margin:0 auto;";
            h1 { (&text.title) }
            p.secondary { (&text.description) }
        }
    }
}

fn instructions(translator: &Translator, lang: Lang) -> Markup {
    let t = |key: &str| translator.t(lang, key).to_owned();
    html! {
        section {
            h2 { (t("instructions.title")) }
            ol {
                li { (t("instructions.step1")) " (" a href="/" { (t("nav.create")) } ")" }
                li { (t("instructions.step2")) " (" a href="/readqr" { (t("nav.read")) } ")" }
                li { (t("instructions.step3")) }
            }
        }
    }
}

/// Encode page with the data form.
///
/// `url_prefix` pre-fills the data field; blank falls back to [`FALLBACK_DATA`].
pub fn home_page(translator: &Translator, lang: Lang, url_prefix: &str) -> String {
    let text = PageText::load(translator, lang, "home");
    let t = |key: &str| translator.t(lang, key).to_owned();
    let default_data = if url_prefix.trim().is_empty() {
        FALLBACK_DATA
    } else {
        url_prefix
    };

    let body = html! {
        section.grid x-data="qrHome()" aria-label=(&text.title) {
            article {
                (header(&text))
                (instructions(translator, lang))
            }
            article.contrast {
                form #qr-form hx-get="/fragments/qr" hx-target="#qr-modal" hx-swap="innerHTML" hx-indicator="#loading-indicator" {
                    label for="data" {
                        span { (t("labelData")) }
                        textarea #data name="data" rows="4" placeholder=(t("placeholderData")) x-ref="dataInput" required { (default_data) }
                    }
                    input #qr-size type="hidden" name="size" value="320";
                    input type="hidden" name="format" value="png";
                    progress #loading-indicator value="0" max="100" hidden aria-label=(t("loading")) {}
                    div.grid {
                        button.secondary type="button" x-on:click="copyData()" { (t("copy")) }
                        button.primary type="submit" { (t("generateQR")) }
                    }
                    small.secondary #copy-toast x-show="toast" x-text="toast" role="status" aria-live="polite" {}
                }
            }
        }
        div #qr-modal {}
    };

    layout(translator, lang, &text, body, HOME_SCRIPT).into_string()
}

/// Scan page: camera switcher, video sink and the result dialog.
///
/// The switcher buttons are filled in by the page script once cameras are
/// enumerated.
pub fn read_page(translator: &Translator, lang: Lang) -> String {
    let text = PageText::load(translator, lang, "readqr");
    let t = |key: &str| translator.t(lang, key).to_owned();

    let body = html! {
        section.grid x-data="qrReader()" x-init="init()" {
            article {
                (header(&text))
                (instructions(translator, lang))
            }
            article.contrast {
                div x-show="choices.length" {
                    p.secondary { (t("camera.label")) }
                    div.grid style="grid-template-columns: 1fr 1fr;" {
                        template x-for="choice in choices" x-bind:key="choice.value" {
                            button type="button"
                                x-bind:aria-pressed="activeCamera === choice.value"
                                x-bind:class="activeCamera === choice.value ? 'primary' : 'secondary'"
                                x-on:click="switchCamera(choice.value)"
                                x-text="choice.label" {}
                        }
                    }
                }
                div x-show="errorMessage" role="alert" { strong x-text="errorMessage" {} }
                figure {
                    video #qr-video x-ref="video" muted playsinline style="width: 100%; height: auto;" {}
                }
                p x-show="loading" role="status" aria-live="polite" { (t("loading")) }
            }
            dialog x-ref="dialog" x-on:cancel="$event.preventDefault(); closeDialog()" {
                article {
                    header {
                        h3 { (t("scanResult")) }
                        button.secondary type="button" aria-label=(t("close")) x-on:click="closeDialog()" {
                            span aria-hidden="true" { "✕" }
                        }
                    }
                    textarea rows="4" readonly x-model="result" {}
                    footer {
                        button.secondary type="button" x-on:click="copyResult()" { (t("copy")) }
                        button.primary type="button" x-on:click="closeDialog()" { (t("close")) }
                    }
                }
            }
        }
    };

    layout(translator, lang, &text, body, READER_SCRIPT).into_string()
}

/// Language-agnostic 404 page.
pub fn not_found_page() -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Not Found" }
                link rel="stylesheet" href=(PICO_CSS);
            }
            body {
                main.container {
                    p.secondary { "404" }
                    h1 { "Page not found" }
                    p { a href="/" { "Go home" } }
                }
            }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        Translator::bundled().unwrap()
    }

    #[test]
    fn home_prefills_fallback_when_prefix_is_blank() {
        let page = home_page(&translator(), Lang::En, "");
        assert!(page.contains(&format!(">{FALLBACK_DATA}</textarea>")));
    }

    #[test]
    fn home_prefills_configured_prefix() {
        let page = home_page(&translator(), Lang::En, "https://files.example/<x>");
        assert!(page.contains(">https://files.example/&lt;x&gt;</textarea>"));
    }

    #[test]
    fn markup_in_prefix_stays_text() {
        let page = home_page(&translator(), Lang::En, r#"</textarea><script>alert("x")</script>"#);
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;/textarea&gt;&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;</textarea>"));
    }

    #[test]
    fn form_targets_the_modal_host() {
        let page = home_page(&translator(), Lang::En, "");
        assert!(page.contains(r##"hx-target="#qr-modal""##));
        assert!(page.contains(r##"hx-indicator="#loading-indicator""##));
        assert!(page.contains(r#"<div id="qr-modal"></div>"#));
    }

    #[test]
    fn pages_are_localized() {
        let page = read_page(&translator(), Lang::Ja);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(r#"<html lang="ja">"#));
        assert!(page.contains("QRコード読取"));
        assert!(page.contains("背面"));
    }

    #[test]
    fn read_page_ships_camera_messages() {
        let page = read_page(&translator(), Lang::En);
        assert!(page.contains("permissionDenied: \"Camera access was denied."));
        assert!(page.contains("environment: \"Rear\""));
        assert!(page.contains("function qrReader()"));
    }

    #[test]
    fn read_page_lists_offered_cameras() {
        let page = read_page(&translator(), Lang::En);
        assert!(page.contains(r#"x-for="choice in choices""#));
        assert!(page.contains(r#"x-on:click="switchCamera(choice.value)""#));
        assert!(page.contains("function cameraChoices(cameras)"));
    }

    #[test]
    fn camera_switch_waits_for_the_dialog() {
        let page = read_page(&translator(), Lang::En);
        let switch = &page[page.find("switchCamera(id) {").unwrap()..page.find("closeDialog() {").unwrap()];
        assert!(switch.contains("if (this.dialogOpen())"));
        let (open_branch, _) = switch.split_once("} else {").unwrap();
        assert!(!open_branch.contains("start()"));
    }

    #[test]
    fn script_strings_cannot_close_the_script_tag() {
        assert_eq!(script_string("a</script>\"b"), r#""a<\/script>\"b""#);
    }
}
