use crate::data_models::DisplayResult;

/// A row as the dropdown widget hands it back for decoration. The widget mixes
/// real results with rows of its own (the loading row, group headers), which is
/// why `parent_title` can be absent here even though `DisplayResult` always
/// resolves it.
#[derive(Debug, Clone, Default)]
pub struct DropdownItem {
    pub parent_title: Option<String>,
    pub text: String,
    pub relevant_text: String,
}

impl From<&DisplayResult> for DropdownItem {
    fn from(result: &DisplayResult) -> DropdownItem {
        DropdownItem {
            parent_title: Some(result.parent_title.clone()),
            text: result.text.clone(),
            relevant_text: result.relevant_text.clone(),
        }
    }
}

/// Render one dropdown row. Loading rows get the literal indicator, rows
/// without a parent title (widget placeholders/headers) render as nothing,
/// results get the section/subsection/snippet fragment. Titles and snippets
/// come from the server and are escaped before they touch markup.
pub fn decorate_result(item: &DropdownItem, loading: bool) -> String {
    if loading {
        return "Searching...".to_string();
    }
    let Some(parent_title) = item.parent_title.as_deref() else {
        return String::new();
    };
    format!(
        "<div class=\"res_section\"><span>{}</span>\
         <div class=\"res_subsection\">{}</div>\
         <div class=\"res_text\">{}</div></div>",
        escape_html(parent_title),
        escape_html(&item.text),
        escape_html(&item.relevant_text),
    )
}

/// Escapes HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
