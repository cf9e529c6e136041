//! ASP.NET postback handling
//!
//! Pager links on WebForms pages look like
//! `javascript:__doPostBack('ctl00$Main$GridView1','Page$2')`. Running one
//! means submitting the page's server form with `__EVENTTARGET` and
//! `__EVENTARGUMENT` set, carrying every other successful control
//! (`__VIEWSTATE`, `__EVENTVALIDATION`, ...) along unchanged.

use super::{EngineError, EngineResult, PageSnapshot};
use scraper::{ElementRef, Selector};
use url::Url;

const SCRIPT_SCHEME: &str = "javascript:";
const POSTBACK_CALL: &str = "__doPostBack(";

/// A client-side navigation action found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDirective {
    /// `__doPostBack(target, argument)`
    Postback { target: String, argument: String },

    /// Any other `javascript:` href
    Script(String),
}

/// Parses an href into a navigation directive
///
/// Returns `None` for ordinary links, which carry no client-side directive.
pub fn parse_directive(href: &str) -> Option<NavigationDirective> {
    let trimmed = href.trim();
    let scheme = trimmed.get(..SCRIPT_SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(SCRIPT_SCHEME) {
        return None;
    }
    let body = trimmed[SCRIPT_SCHEME.len()..].trim();

    let postback = body
        .find(POSTBACK_CALL)
        .map(|start| &body[start + POSTBACK_CALL.len()..])
        .and_then(|rest| rest.find(')').map(|end| &rest[..end]))
        .map(quoted_arguments);

    match postback {
        Some(args) if args.len() == 2 => Some(NavigationDirective::Postback {
            target: args[0].clone(),
            argument: args[1].clone(),
        }),
        _ => Some(NavigationDirective::Script(body.to_string())),
    }
}

/// Collects the contents of every quoted literal in an argument list
fn quoted_arguments(list: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in list.chars() {
        match quote {
            Some(q) if ch == q => {
                args.push(std::mem::take(&mut current));
                quote = None;
            }
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None => {}
        }
    }

    args
}

/// Builds the form submission a browser would send for a postback
///
/// Returns the resolved form action and the url-encodable field list.
pub fn build_postback_form(
    page: &PageSnapshot,
    target: &str,
    argument: &str,
) -> EngineResult<(Url, Vec<(String, String)>)> {
    let document = page.document();
    let form_selector = selector("form")?;
    let form = document
        .select(&form_selector)
        .next()
        .ok_or_else(|| EngineError::NoForm {
            url: page.url().to_string(),
        })?;

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => page.url().join(action)?,
        _ => page.url().clone(),
    };

    let mut fields = successful_controls(form)?;
    set_field(&mut fields, "__EVENTTARGET", target);
    set_field(&mut fields, "__EVENTARGUMENT", argument);

    Ok((action, fields))
}

/// Disabled controls, and controls inside a disabled fieldset, are never sent
fn is_disabled(control: ElementRef<'_>) -> bool {
    control.value().attr("disabled").is_some()
        || control
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == "fieldset" && a.value().attr("disabled").is_some())
}

/// Name/value pairs of the controls a browser would submit
fn successful_controls(form: ElementRef<'_>) -> EngineResult<Vec<(String, String)>> {
    let mut fields = Vec::new();

    for input in form.select(&selector("input[name]")?).filter(|c| !is_disabled(*c)) {
        let element = input.value();
        let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
        let submitted = match kind.as_str() {
            "submit" | "button" | "image" | "reset" | "file" => false,
            "checkbox" | "radio" => element.attr("checked").is_some(),
            _ => true,
        };
        if !submitted {
            continue;
        }
        let value = match kind.as_str() {
            "checkbox" | "radio" => element.attr("value").unwrap_or("on"),
            _ => element.attr("value").unwrap_or(""),
        };
        if let Some(name) = element.attr("name") {
            fields.push((name.to_string(), value.to_string()));
        }
    }

    let option_selector = selector("option")?;
    for select in form.select(&selector("select[name]")?).filter(|c| !is_disabled(*c)) {
        let options: Vec<ElementRef<'_>> = select.select(&option_selector).collect();
        let chosen = options
            .iter()
            .find(|o| o.value().attr("selected").is_some())
            .or_else(|| options.first());
        if let (Some(name), Some(option)) = (select.value().attr("name"), chosen) {
            let value = option
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| option.text().collect::<String>().trim().to_string());
            fields.push((name.to_string(), value));
        }
    }

    for area in form.select(&selector("textarea[name]")?).filter(|c| !is_disabled(*c)) {
        if let Some(name) = area.value().attr("name") {
            fields.push((name.to_string(), area.text().collect()));
        }
    }

    Ok(fields)
}

fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    match fields.iter_mut().find(|(n, _)| n == name) {
        Some(field) => field.1 = value.to_string(),
        None => fields.push((name.to_string(), value.to_string())),
    }
}

fn selector(css: &str) -> EngineResult<Selector> {
    super::compile_selector(css)
}
