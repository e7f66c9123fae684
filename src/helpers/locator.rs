//! Locator rewriting for hosted spreadsheet share links.

/// Marker of a Google Sheets document URL
const GOOGLE_SHEETS_MARKER: &str = "docs.google.com/spreadsheets";
/// Path segment of the editor view
const EDIT_SEGMENT: &str = "/edit";
/// Endpoint that downloads the whole document as an xlsx workbook
const EXPORT_SEGMENT: &str = "/export?format=xlsx";

/// Rewrites a Google Sheets share link (`.../d/<id>/edit#gid=0`) into its
/// direct xlsx export form (`.../d/<id>/export?format=xlsx`).
/// Any other locator is returned unchanged.
pub fn to_export_url(locator: &str) -> String {
    if locator.contains(GOOGLE_SHEETS_MARKER) {
        if let Some(index) = locator.find(EDIT_SEGMENT) {
            return format!("{}{}", &locator[..index], EXPORT_SEGMENT);
        }
    }
    locator.to_owned()
}
