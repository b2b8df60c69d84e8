// Batch download references and packaging
// A reference is base64url("{batch_id}:{recipient_email}"); knowing the email is what
// grants access, so every decoding or lookup failure looks the same to the caller

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use base64::{
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
    Engine as _,
};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::certificates::code::short_code;
use crate::certificates::{CertificateError, CertificateTemplate};
use crate::documents::RenderedCertificate;

pub const ZIP_FILENAME: &str = "certificates.zip";

pub fn encode_download_ref(batch_id: i32, recipient_email: &str) -> String {
    URL_SAFE.encode(format!("{}:{}", batch_id, recipient_email))
}

/// Split a reference into batch id and email, `None` for anything malformed
pub fn decode_download_ref(reference: &str) -> Option<(i32, String)> {
    let reference = reference.trim().trim_end_matches('/');
    let bytes = URL_SAFE
        .decode(reference)
        .or_else(|_| URL_SAFE_NO_PAD.decode(reference))
        .ok()?;
    let decoded = String::from_utf8(bytes).ok()?;

    let (batch_id, email) = decoded.split_once(':')?;
    let batch_id = batch_id.parse().ok()?;
    if email.is_empty() {
        return None;
    }
    Some((batch_id, email.to_string()))
}

/// File name of one certificate inside a download
pub fn certificate_filename(template: CertificateTemplate, club_name: &str, code: &str) -> String {
    let prefix = match template {
        CertificateTemplate::Ag30 => "AG30".to_string(),
        _ => club_name.replace(' ', "_"),
    };
    format!("{}_{}.pdf", prefix, short_code(code))
}

/// Deflate every certificate into one archive
///
/// Repeated names get a numeric suffix so no entry is lost.
pub fn zip_certificates(files: &[RenderedCertificate]) -> Result<Vec<u8>, CertificateError> {
    let to_error = |e: &dyn std::fmt::Display| CertificateError::Document(e.to_string());

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut used = HashSet::new();
        for file in files {
            let mut name = file.filename.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                let stem = file.filename.trim_end_matches(".pdf");
                name = format!("{}-{}.pdf", stem, n);
                n += 1;
            }

            zip.start_file(name, options).map_err(|e| to_error(&e))?;
            zip.write_all(&file.bytes).map_err(|e| to_error(&e))?;
        }

        zip.finish().map_err(|e| to_error(&e))?;
    }

    Ok(buf.into_inner())
}

/// One certificate streams as a PDF, several as a zip
pub fn download_response(mut files: Vec<RenderedCertificate>) -> Result<Response, CertificateError> {
    if files.len() == 1 {
        let file = files.remove(0);
        let disposition = format!(
            "attachment; filename=\"{}\"",
            urlencoding::encode(&file.filename)
        );
        return Ok((
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            file.bytes,
        )
            .into_response());
    }

    let archive = zip_certificates(&files)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ZIP_FILENAME),
            ),
        ],
        archive,
    )
        .into_response())
}
