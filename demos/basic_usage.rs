//! Basic usage of the B2 client
//!
//! This demo:
//! - Authorizes an account
//! - Creates a bucket
//! - Uploads a file and reads its metadata back
//! - Lists and downloads files
//! - Hides and deletes files, then removes the bucket
//!
//! Start an emulator with `cargo run -p b2-emulator`, then run with:
//!
//! ```text
//! B2_AUTH_URL=http://127.0.0.1:8180 \
//! B2_ACCOUNT_ID=emulator-account B2_APPLICATION_KEY=emulator-key \
//! cargo run --example basic_usage
//! ```

use b2_client::{BucketType, Config, Credentials, Session, UploadFile, DEFAULT_AUTH_URL};
use sha1::{Digest, Sha1};
use std::io::Cursor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("🚀 B2 Storage - Basic Usage Demo\n");

    let auth_url = std::env::var("B2_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string());
    let config = Config::new(auth_url);
    let credentials = Credentials::from_env()?;

    let session = Session::authenticate_with(&config, &credentials).await?;
    println!("🔑 Authorized account {}", session.account_id());
    println!("   API: {}", session.api_url());

    // ==================== Bucket Operations ====================

    println!("\n📦 Creating bucket 'demo-bucket-1'...");
    let bucket = session.create_bucket("demo-bucket-1", BucketType::AllPrivate).await?;
    println!("   ✅ Created {} ({})", bucket.bucket_name, bucket.bucket_id);

    println!("\n📋 Listing all buckets...");
    for bucket in session.list_buckets().await? {
        println!("   - {} [{}]", bucket.bucket_name, bucket.bucket_type);
    }

    let mut bucket = session.bucket(bucket);

    // ==================== File Operations ====================

    let content = b"Hello, World! This is stored in B2.".to_vec();
    let sha1 = hex::encode(Sha1::digest(&content));

    println!("\n📤 Uploading 'docs/hello.txt'...");
    let file = UploadFile::new("docs/hello.txt", content.len() as u64, sha1)
        .with_content_type("text/plain")
        .with_info("author", "demo");
    let uploaded = bucket.upload_file(Cursor::new(content), file).await?;
    println!("   ✅ Uploaded with id {}", uploaded.file_id);

    for i in 1..=3 {
        let content = format!("Content of file {}", i).into_bytes();
        let sha1 = hex::encode(Sha1::digest(&content));
        let file = UploadFile::new(format!("data/file{}.txt", i), content.len() as u64, sha1);
        bucket.upload_file(Cursor::new(content), file).await?;
    }
    println!("   ✅ Uploaded 3 additional files (one upload lease)");

    println!("\n🔍 Reading metadata of 'docs/hello.txt'...");
    let info = session.get_file_info(&uploaded.file_id).await?;
    println!("   Content-Type: {}", info.content_type);
    println!("   Size: {} bytes", info.content_length);
    println!("   SHA-1: {}", info.content_sha1);

    println!("\n📋 Listing file names, two per page...");
    let mut start: Option<String> = None;
    loop {
        let page = bucket.list_file_names(start.as_deref(), Some(2)).await?;
        for file in &page.files {
            println!("   - {} ({} bytes)", file.file_name, file.size);
        }
        if page.is_last() {
            break;
        }
        start = page.next_file_name;
    }

    println!("\n📥 Downloading 'docs/hello.txt'...");
    let mut data = Vec::new();
    let downloaded = bucket.download_file("docs/hello.txt", &mut data).await?;
    println!("   Content: {}", String::from_utf8_lossy(&data));
    println!("   Author: {:?}", downloaded.info.get("author"));

    // ==================== Cleanup ====================

    println!("\n🙈 Hiding 'docs/hello.txt'...");
    bucket.hide_file("docs/hello.txt").await?;

    println!("\n🗑️  Deleting every file version...");
    let mut cursor = None;
    loop {
        let page = bucket.list_file_versions(cursor.as_ref(), None).await?;
        for version in &page.files {
            session
                .delete_file_version(&version.file_name, &version.file_id)
                .await?;
        }
        if page.is_last() {
            break;
        }
        cursor = page.next;
    }

    bucket.delete().await?;
    println!("   ✅ Bucket deleted");

    println!("\n✨ Done!");
    Ok(())
}
