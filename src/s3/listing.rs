//! Mapping of S3 XML list responses (ListBuckets, ListObjectsV2) into
//! bucket, folder and file values.
//!
//! Repeatable elements (`Bucket`, `Contents`, `CommonPrefixes`) are `Vec`
//! fields on the wire structs, so a single occurrence and many occurrences
//! decode the same way.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::files::{extension, is_previewable, FileKind};

/// Delimiter used for folder synthesis
pub const DELIMITER: &str = "/";

const LIST_BUCKETS_ROOT: &str = "ListAllMyBucketsResult";
const LIST_OBJECTS_ROOT: &str = "ListBucketResult";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    /// Creation timestamp as sent by the store (ISO 8601)
    pub creation_date: String,
}

/// Virtual directory synthesized from a common prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Full prefix, always ending with the delimiter
    pub prefix: String,
    /// Prefix relative to the listed prefix, without trailing delimiter
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    pub key: String,
    /// Key relative to the listed prefix
    pub name: String,
    pub size: u64,
    pub last_modified: String,
    /// Entity tag without surrounding quotes
    pub etag: Option<String>,
}

impl FileObject {
    /// Lower-cased extension of the display name
    pub fn extension(&self) -> String {
        extension(&self.name)
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_extension(&self.extension())
    }

    /// Whether a presigned URL to this file can be shown inline
    pub fn is_previewable(&self) -> bool {
        is_previewable(&self.extension())
    }
}

/// One page of a delimited object listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingResult {
    pub folders: Vec<Folder>,
    pub files: Vec<FileObject>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

impl ListingResult {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// Append a following page, taking over its pagination state
    pub fn merge_page(&mut self, page: ListingResult) {
        self.folders.extend(page.folders);
        self.files.extend(page.files);
        self.is_truncated = page.is_truncated;
        self.next_continuation_token = page.next_continuation_token;
    }
}

// Wire structs

#[derive(Debug, Deserialize)]
struct ListAllMyBucketsResultXml {
    #[serde(rename = "Buckets", default)]
    buckets: BucketsXml,
}

#[derive(Debug, Default, Deserialize)]
struct BucketsXml {
    #[serde(rename = "Bucket", default)]
    bucket: Vec<BucketXml>,
}

#[derive(Debug, Deserialize)]
struct BucketXml {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "CreationDate", default)]
    creation_date: String,
}

#[derive(Debug, Deserialize)]
struct ListBucketResultXml {
    #[serde(rename = "IsTruncated", default)]
    is_truncated: Option<String>,
    #[serde(rename = "NextContinuationToken", default)]
    next_continuation_token: Option<String>,
    #[serde(rename = "Contents", default)]
    contents: Vec<ContentsXml>,
    #[serde(rename = "CommonPrefixes", default)]
    common_prefixes: Vec<CommonPrefixXml>,
}

#[derive(Debug, Deserialize)]
struct ContentsXml {
    #[serde(rename = "Key", default)]
    key: String,
    #[serde(rename = "LastModified", default)]
    last_modified: Option<String>,
    #[serde(rename = "ETag", default)]
    etag: Option<String>,
    // Kept as text so a bad number degrades to 0 instead of failing the page
    #[serde(rename = "Size", default)]
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommonPrefixXml {
    #[serde(rename = "Prefix", default)]
    prefix: String,
}

/// Local name of the document's root element, if there is one
fn root_element(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                return Ok(Some(name));
            }
            Ok(Event::Decl(_))
            | Ok(Event::Comment(_))
            | Ok(Event::PI(_))
            | Ok(Event::DocType(_)) => continue,
            // Eof, or text before any element
            Ok(_) => return Ok(None),
            Err(e) => {
                return Err(StoreError::MalformedResponse(format!(
                    "XML parse error: {}",
                    e
                )))
            }
        }
    }
}

fn expect_root(xml: &str, expected: &str) -> Result<()> {
    match root_element(xml)? {
        Some(name) if name == expected => Ok(()),
        Some(name) => Err(StoreError::MalformedResponse(format!(
            "expected <{}> root element, found <{}>",
            expected, name
        ))),
        None => Err(StoreError::MalformedResponse(format!(
            "missing <{}> root element",
            expected
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_size(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
}

fn strip_quotes(etag: &str) -> String {
    etag.trim().trim_matches('"').to_string()
}

/// Parse a ListBuckets response body
pub fn parse_buckets(xml: &str) -> Result<Vec<Bucket>> {
    expect_root(xml, LIST_BUCKETS_ROOT)?;

    let parsed: ListAllMyBucketsResultXml = quick_xml::de::from_str(xml)
        .map_err(|e| StoreError::MalformedResponse(format!("ListBuckets: {}", e)))?;

    Ok(parsed
        .buckets
        .bucket
        .into_iter()
        .map(|b| Bucket {
            name: b.name,
            creation_date: b.creation_date,
        })
        .collect())
}

/// Parse a ListObjectsV2 response body listed under `requested_prefix`
/// with the `/` delimiter
///
/// Common prefixes become folders; an object whose key equals the requested
/// prefix is the directory marker and is dropped.
pub fn parse_listing(xml: &str, requested_prefix: &str) -> Result<ListingResult> {
    parse_listing_with_delimiter(xml, requested_prefix, DELIMITER)
}

/// Parse a ListObjectsV2 response body requested with `delimiter`
pub fn parse_listing_with_delimiter(
    xml: &str,
    requested_prefix: &str,
    delimiter: &str,
) -> Result<ListingResult> {
    expect_root(xml, LIST_OBJECTS_ROOT)?;

    let parsed: ListBucketResultXml = quick_xml::de::from_str(xml)
        .map_err(|e| StoreError::MalformedResponse(format!("ListObjectsV2: {}", e)))?;
    let verbatim = verbatim_names(xml)?;

    let folders = parsed
        .common_prefixes
        .into_iter()
        .enumerate()
        .map(|(i, cp)| {
            let prefix = verbatim.prefixes.get(i).cloned().flatten().unwrap_or(cp.prefix);
            folder_from_prefix(prefix, requested_prefix, delimiter)
        })
        .collect();

    let files = parsed
        .contents
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let key = verbatim.keys.get(i).cloned().flatten().unwrap_or(item.key);
            (key, item.size, item.last_modified, item.etag)
        })
        .filter(|(key, ..)| key != requested_prefix)
        .map(|(key, size, last_modified, etag)| FileObject {
            name: key.strip_prefix(requested_prefix).unwrap_or(&key).to_string(),
            size: parse_size(size.as_deref()),
            last_modified: last_modified.unwrap_or_default(),
            etag: non_empty(etag.map(|e| strip_quotes(&e))),
            key,
        })
        .collect();

    Ok(ListingResult {
        folders,
        files,
        is_truncated: parse_bool(parsed.is_truncated.as_deref()),
        next_continuation_token: non_empty(parsed.next_continuation_token),
    })
}

fn folder_from_prefix(mut prefix: String, requested_prefix: &str, delimiter: &str) -> Folder {
    if !prefix.ends_with(delimiter) {
        prefix.push_str(delimiter);
    }
    let relative = prefix.strip_prefix(requested_prefix).unwrap_or(&prefix);
    let name = relative
        .strip_suffix(delimiter)
        .unwrap_or(relative)
        .to_string();
    Folder { prefix, name }
}

/// `Contents/Key` and `CommonPrefixes/Prefix` text exactly as sent
///
/// The serde decoder trims text, but keys may legally start or end with
/// whitespace. Entries line up with the decoded `Vec`s by position; `None`
/// marks an element without that child.
#[derive(Debug, Default)]
struct VerbatimNames {
    keys: Vec<Option<String>>,
    prefixes: Vec<Option<String>>,
}

fn verbatim_names(xml: &str) -> Result<VerbatimNames> {
    let mut reader = Reader::from_str(xml);
    let mut names = VerbatimNames::default();
    let mut path: Vec<String> = Vec::new();
    let mut text: Option<String> = None;

    let malformed = |e: quick_xml::Error| StoreError::MalformedResponse(format!("XML parse error: {}", e));

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                match verbatim_slot(&path) {
                    Some(Slot::Entry(kind)) => names.entries(kind).push(None),
                    Some(Slot::Name(_)) => text = Some(String::new()),
                    None => {}
                }
            }
            Event::Empty(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                match verbatim_slot(&path) {
                    Some(Slot::Entry(kind)) => names.entries(kind).push(None),
                    Some(Slot::Name(kind)) => names.set_last(kind, String::new()),
                    None => {}
                }
                path.pop();
            }
            Event::Text(e) => {
                if let Some(buf) = text.as_mut() {
                    buf.push_str(&e.unescape().map_err(malformed)?);
                }
            }
            Event::CData(e) => {
                if let Some(buf) = text.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if let (Some(Slot::Name(kind)), Some(value)) = (verbatim_slot(&path), text.take()) {
                    names.set_last(kind, value);
                }
                path.pop();
            }
            Event::Eof => return Ok(names),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum NameKind {
    Key,
    Prefix,
}

enum Slot {
    /// A `Contents` or `CommonPrefixes` element
    Entry(NameKind),
    /// Its `Key` or `Prefix` child
    Name(NameKind),
}

fn verbatim_slot(path: &[String]) -> Option<Slot> {
    match path {
        [_, entry] if entry == "Contents" => Some(Slot::Entry(NameKind::Key)),
        [_, entry] if entry == "CommonPrefixes" => Some(Slot::Entry(NameKind::Prefix)),
        [_, entry, name] if entry == "Contents" && name == "Key" => Some(Slot::Name(NameKind::Key)),
        [_, entry, name] if entry == "CommonPrefixes" && name == "Prefix" => {
            Some(Slot::Name(NameKind::Prefix))
        }
        _ => None,
    }
}

impl VerbatimNames {
    fn entries(&mut self, kind: NameKind) -> &mut Vec<Option<String>> {
        match kind {
            NameKind::Key => &mut self.keys,
            NameKind::Prefix => &mut self.prefixes,
        }
    }

    fn set_last(&mut self, kind: NameKind, value: String) {
        if let Some(slot) = self.entries(kind).last_mut() {
            *slot = Some(value);
        }
    }
}
