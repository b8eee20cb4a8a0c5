use tfguard_policy::{Absent, AttributeCheck, Category, CheckMetadata, Malformed, PolicyError, Registry};

pub const S3_BUCKET: &str = "aws_s3_bucket";
pub const KMS_KEY: &str = "aws_kms_key";

pub const S3_BUCKET_OBJECT_LOCK: &str = "CKV_AWS_143";
pub const S3_BUCKET_VERSIONING: &str = "CKV_AWS_21";
pub const S3_BUCKET_ENCRYPTION: &str = "CKV_AWS_19";
pub const KMS_KEY_ROTATION: &str = "CKV_AWS_7";

/// Object lock is optional: a bucket without `object_lock_configuration` passes, one that
/// sets anything but `"Enabled"` fails. A non-scalar `object_lock_enabled` fails too.
pub fn s3_bucket_object_lock() -> AttributeCheck {
    AttributeCheck::new(
        CheckMetadata::new(S3_BUCKET_OBJECT_LOCK, "Ensure that S3 bucket has lock configuration enabled by default")
            .category(Category::GeneralSecurity)
            .resources([S3_BUCKET])
            .absent(Absent::Pass)
            .malformed(Malformed::Fail),
        "object_lock_configuration.object_lock_enabled",
        ["Enabled"],
    )
}

pub fn s3_bucket_versioning() -> AttributeCheck {
    AttributeCheck::new(
        CheckMetadata::new(S3_BUCKET_VERSIONING, "Ensure all data stored in the S3 bucket have versioning enabled")
            .category(Category::BackupAndRecovery)
            .resources([S3_BUCKET])
            .absent(Absent::Fail),
        "versioning.enabled",
        [true],
    )
}

pub fn s3_bucket_encryption() -> AttributeCheck {
    AttributeCheck::new(
        CheckMetadata::new(S3_BUCKET_ENCRYPTION, "Ensure all data stored in the S3 bucket is securely encrypted at rest")
            .category(Category::Encryption)
            .resources([S3_BUCKET])
            .absent(Absent::Fail),
        "server_side_encryption_configuration.rule.apply_server_side_encryption_by_default.sse_algorithm",
        ["AES256", "aws:kms"],
    )
}

pub fn kms_key_rotation() -> AttributeCheck {
    AttributeCheck::new(
        CheckMetadata::new(KMS_KEY_ROTATION, "Ensure rotation for customer created CMKs is enabled")
            .category(Category::Encryption)
            .resources([KMS_KEY])
            .absent(Absent::Fail),
        "enable_key_rotation",
        [true],
    )
}

pub fn checks() -> Vec<AttributeCheck> {
    vec![
        s3_bucket_object_lock(),
        s3_bucket_versioning(),
        s3_bucket_encryption(),
        kms_key_rotation(),
    ]
}

pub fn register(registry: &mut Registry) -> Result<(), PolicyError> {
    for check in checks() {
        registry.register(check)?;
    }
    Ok(())
}
