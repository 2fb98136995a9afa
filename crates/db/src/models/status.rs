//! Status and type enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table. Lifecycle code reads status ids back
//! from rows, so each enum also offers `from_id` and a stable `name`
//! matching the seeded `name` column.

use capacita_core::certificate::CertificateKind;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// The seeded `name` column value for this variant.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            /// Look up the variant for a raw status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Human-readable name for a raw status ID, for error messages.
            pub fn name_of(id: StatusId) -> &'static str {
                Self::from_id(id).map(Self::name).unwrap_or("unknown")
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Pre-registration review status.
    PreRegistrationStatus {
        Pending = 1 => "pending",
        Approved = 2 => "approved",
        Rejected = 3 => "rejected",
    }
}

define_status_enum! {
    /// Official enrollment lifecycle status.
    EnrollmentStatus {
        Enrolled = 1 => "enrolled",
        Approved = 2 => "approved",
        Failed = 3 => "failed",
        Withdrawn = 4 => "withdrawn",
    }
}

define_status_enum! {
    /// Certificate type issued against a completed enrollment.
    CertificateType {
        Participation = 1 => "participation",
        Approval = 2 => "approval",
        HonorMention = 3 => "honor_mention",
    }
}

impl From<CertificateKind> for CertificateType {
    fn from(kind: CertificateKind) -> Self {
        match kind {
            CertificateKind::Participation => Self::Participation,
            CertificateKind::Approval => Self::Approval,
            CertificateKind::HonorMention => Self::HonorMention,
        }
    }
}

impl From<CertificateType> for CertificateKind {
    fn from(ty: CertificateType) -> Self {
        match ty {
            CertificateType::Participation => Self::Participation,
            CertificateType::Approval => Self::Approval,
            CertificateType::HonorMention => Self::HonorMention,
        }
    }
}
