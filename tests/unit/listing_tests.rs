// List response mapping tests: buckets, folders, files, pagination, failures

use kasasagi::files::FileKind;
use kasasagi::s3::{parse_buckets, parse_listing, parse_listing_with_delimiter, Folder};
use kasasagi::StoreError;

const SINGLE_BUCKET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Owner>
    <ID>b41959b701734cef1281bd772b0414cf</ID>
    <DisplayName>b41959b701734cef1281bd772b0414cf</DisplayName>
  </Owner>
  <Buckets>
    <Bucket>
      <Name>courses</Name>
      <CreationDate>2025-09-01T08:00:00.000Z</CreationDate>
    </Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;

const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>courses</Name>
  <Prefix>a/</Prefix>
  <KeyCount>4</KeyCount>
  <MaxKeys>1000</MaxKeys>
  <Delimiter>/</Delimiter>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=</NextContinuationToken>
  <Contents>
    <Key>a/</Key>
    <LastModified>2025-09-01T08:00:00.000Z</LastModified>
    <ETag>"d41d8cd98f00b204e9800998ecf8427e"</ETag>
    <Size>0</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>a/report.pdf</Key>
    <LastModified>2025-09-02T10:15:30.000Z</LastModified>
    <ETag>&quot;9b2cf535f27731c974343645a3985328&quot;</ETag>
    <Size>52431</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>a/notes.txt</Key>
    <LastModified>2025-09-03T12:00:00.000Z</LastModified>
    <Size>not-a-number</Size>
  </Contents>
  <CommonPrefixes>
    <Prefix>a/b/</Prefix>
  </CommonPrefixes>
  <CommonPrefixes>
    <Prefix>a/c/</Prefix>
  </CommonPrefixes>
</ListBucketResult>"#;

#[test]
fn test_parse_buckets_single_bucket_is_a_sequence() {
    let buckets = parse_buckets(SINGLE_BUCKET).unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].name, "courses");
    assert_eq!(buckets[0].creation_date, "2025-09-01T08:00:00.000Z");
}

#[test]
fn test_parse_buckets_many_in_document_order() {
    let xml = r#"<ListAllMyBucketsResult>
  <Buckets>
    <Bucket><Name>alpha</Name><CreationDate>2024-01-01T00:00:00.000Z</CreationDate></Bucket>
    <Bucket><Name>beta</Name><CreationDate>2024-02-01T00:00:00.000Z</CreationDate></Bucket>
    <Bucket><Name>gamma</Name><CreationDate>2024-03-01T00:00:00.000Z</CreationDate></Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;

    let names: Vec<String> = parse_buckets(xml)
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_parse_buckets_empty_account() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult><Owner><ID>x</ID></Owner><Buckets></Buckets></ListAllMyBucketsResult>"#;
    assert!(parse_buckets(xml).unwrap().is_empty());

    let xml = "<ListAllMyBucketsResult><Buckets/></ListAllMyBucketsResult>";
    assert!(parse_buckets(xml).unwrap().is_empty());

    let xml = "<ListAllMyBucketsResult></ListAllMyBucketsResult>";
    assert!(parse_buckets(xml).unwrap().is_empty());
}

#[test]
fn test_parse_buckets_missing_root_is_malformed() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>"#;
    assert!(matches!(
        parse_buckets(xml),
        Err(StoreError::MalformedResponse(_))
    ));
    assert!(matches!(
        parse_buckets("not xml at all"),
        Err(StoreError::MalformedResponse(_))
    ));
    assert!(matches!(parse_buckets(""), Err(StoreError::MalformedResponse(_))));
}

#[test]
fn test_parse_listing_folders_and_files() {
    let result = parse_listing(LISTING, "a/").unwrap();

    assert_eq!(
        result.folders,
        vec![
            Folder {
                prefix: "a/b/".to_string(),
                name: "b".to_string()
            },
            Folder {
                prefix: "a/c/".to_string(),
                name: "c".to_string()
            },
        ]
    );

    // The "a/" marker object is dropped
    assert_eq!(result.files.len(), 2);
    assert!(result.files.iter().all(|f| f.key != "a/"));

    let report = &result.files[0];
    assert_eq!(report.key, "a/report.pdf");
    assert_eq!(report.name, "report.pdf");
    assert_eq!(report.size, 52431);
    assert_eq!(report.last_modified, "2025-09-02T10:15:30.000Z");
    assert_eq!(
        report.etag.as_deref(),
        Some("9b2cf535f27731c974343645a3985328")
    );
    assert_eq!(report.kind(), FileKind::Pdf);

    // A bad Size degrades to 0 instead of failing the listing
    let notes = &result.files[1];
    assert_eq!(notes.name, "notes.txt");
    assert_eq!(notes.size, 0);
    assert_eq!(notes.etag, None);
}

#[test]
fn test_parse_listing_pagination_fields() {
    let result = parse_listing(LISTING, "a/").unwrap();
    assert!(result.is_truncated);
    assert_eq!(
        result.next_continuation_token.as_deref(),
        Some("1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=")
    );
}

#[test]
fn test_parse_listing_single_entries_are_sequences() {
    let xml = r#"<ListBucketResult>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>a/only.png</Key><Size>10</Size></Contents>
  <CommonPrefixes><Prefix>a/b/</Prefix></CommonPrefixes>
</ListBucketResult>"#;

    let result = parse_listing(xml, "a/").unwrap();
    assert_eq!(result.files.len(), 1);
    assert_eq!(result.files[0].name, "only.png");
    assert_eq!(result.folders.len(), 1);
    assert_eq!(result.folders[0].name, "b");
    assert_eq!(result.folders[0].prefix, "a/b/");
    assert!(!result.is_truncated);
    assert_eq!(result.next_continuation_token, None);
}

#[test]
fn test_parse_listing_root_prefix() {
    let xml = r#"<ListBucketResult>
  <Prefix></Prefix>
  <IsTruncated>False</IsTruncated>
  <Contents><Key>syllabus.docx</Key><Size>2048</Size></Contents>
  <CommonPrefixes><Prefix>semester-1/</Prefix></CommonPrefixes>
</ListBucketResult>"#;

    let result = parse_listing(xml, "").unwrap();
    assert_eq!(result.files[0].name, "syllabus.docx");
    assert_eq!(result.files[0].key, "syllabus.docx");
    assert_eq!(result.folders[0].name, "semester-1");
    assert!(!result.is_truncated);
}

#[test]
fn test_parse_listing_empty_is_valid() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>courses</Name>
  <Prefix>empty/</Prefix>
  <KeyCount>0</KeyCount>
  <IsTruncated>false</IsTruncated>
</ListBucketResult>"#;

    let result = parse_listing(xml, "empty/").unwrap();
    assert!(result.is_empty());
    assert!(result.folders.is_empty());
    assert!(result.files.is_empty());
}

#[test]
fn test_parse_listing_only_marker_object_is_empty() {
    let xml = r#"<ListBucketResult>
  <Contents><Key>a/</Key><Size>0</Size></Contents>
</ListBucketResult>"#;

    let result = parse_listing(xml, "a/").unwrap();
    assert!(result.files.is_empty());
}

#[test]
fn test_parse_listing_missing_root_is_malformed() {
    let xml = "<ListAllMyBucketsResult><Buckets/></ListAllMyBucketsResult>";
    assert!(matches!(
        parse_listing(xml, ""),
        Err(StoreError::MalformedResponse(_))
    ));
    assert!(matches!(
        parse_listing("", ""),
        Err(StoreError::MalformedResponse(_))
    ));
}

#[test]
fn test_parse_listing_custom_delimiter() {
    let xml = r#"<ListBucketResult>
  <Contents><Key>a|</Key><Size>0</Size></Contents>
  <Contents><Key>a|x.txt</Key><Size>3</Size></Contents>
  <CommonPrefixes><Prefix>a|b|</Prefix></CommonPrefixes>
  <CommonPrefixes><Prefix>a|c</Prefix></CommonPrefixes>
</ListBucketResult>"#;

    let result = parse_listing_with_delimiter(xml, "a|", "|").unwrap();
    assert_eq!(
        result.folders,
        vec![
            Folder {
                prefix: "a|b|".to_string(),
                name: "b".to_string()
            },
            Folder {
                prefix: "a|c|".to_string(),
                name: "c".to_string()
            },
        ]
    );
    assert_eq!(result.files.len(), 1);
    assert_eq!(result.files[0].name, "x.txt");
}

#[test]
fn test_parse_listing_keeps_key_whitespace() {
    let xml = r#"<ListBucketResult>
  <Contents><Key>a/notes.txt </Key><Size>5</Size></Contents>
  <Contents><Key>a/ draft.pdf</Key><Size>6</Size></Contents>
  <Contents><Key>a/R&amp;D.pdf</Key><Size>7</Size></Contents>
  <Contents><Key><![CDATA[a/raw <1>.txt]]></Key><Size>8</Size></Contents>
  <CommonPrefixes><Prefix>a/ spaced /</Prefix></CommonPrefixes>
</ListBucketResult>"#;

    let result = parse_listing(xml, "a/").unwrap();
    let keys: Vec<&str> = result.files.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["a/notes.txt ", "a/ draft.pdf", "a/R&D.pdf", "a/raw <1>.txt"]
    );
    assert_eq!(result.files[0].name, "notes.txt ");
    assert_eq!(result.files[1].name, " draft.pdf");
    assert_eq!(result.files[3].size, 8);

    assert_eq!(result.folders[0].prefix, "a/ spaced /");
    assert_eq!(result.folders[0].name, " spaced ");
}

#[test]
fn test_parse_listing_marker_with_whitespace_is_kept_apart() {
    // "a/ " is a distinct object from the "a/" marker
    let xml = r#"<ListBucketResult>
  <Contents><Key>a/</Key><Size>0</Size></Contents>
  <Contents><Key>a/ </Key><Size>1</Size></Contents>
</ListBucketResult>"#;

    let result = parse_listing(xml, "a/").unwrap();
    assert_eq!(result.files.len(), 1);
    assert_eq!(result.files[0].key, "a/ ");
}

#[test]
fn test_listing_result_serializes_for_external_cache() {
    let result = parse_listing(LISTING, "a/").unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let restored: kasasagi::s3::ListingResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result);
}
