// S3 signing and listing module
//
// - encoding:    byte-exact SigV4 percent-encoding
// - canonical:   canonical request assembly
// - signing_key: scoped key derivation and string-to-sign
// - signer:      header signing and presigned URLs
// - listing:     ListBuckets / ListObjectsV2 response mapping
// - response:    raw responses, error documents, HEAD metadata

pub mod canonical;
pub mod clock;
pub mod encoding;
pub mod listing;
pub mod response;
pub mod signer;
pub mod signing_key;

pub use canonical::{
    create_canonical_request, payload_hash, sha256_hex, CanonicalHeaders, CanonicalRequest,
    EMPTY_SHA256, UNSIGNED_PAYLOAD,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use encoding::{
    canonical_query_string, canonical_uri, parse_query, uri_decode, uri_encode, uri_encode_bytes,
};
pub use listing::{
    parse_buckets, parse_listing, parse_listing_with_delimiter, Bucket, FileObject, Folder,
    ListingResult, DELIMITER,
};
pub use response::{parse_error_body, ObjectMetadata, S3ErrorBody, StoreResponse};
pub use signer::{
    Credentials, RequestDescriptor, SignedRequest, Signer, DEFAULT_SERVICE, MAX_PRESIGN_EXPIRY,
};
pub use signing_key::{
    calculate_signature, create_string_to_sign, derive_signing_key, hmac_sha256, CredentialScope,
    ALGORITHM,
};
