pub mod account;
pub mod budget;
pub mod category;
pub mod dashboard;
pub mod transaction;
pub mod user;
pub mod wire;

pub use account::{Account, AccountInput, AccountType, AccountUpdate};
pub use budget::{Budget, BudgetForm, BudgetInput, BudgetPeriod, BudgetUpdate};
pub use category::{Category, CategoryInput, CategoryType, CategoryUpdate};
pub use dashboard::{CategorySummary, DashboardStats, MonthlyData};
pub use transaction::{
    Page, PageMeta, Transaction, TransactionFilters, TransactionInput, TransactionType,
    TransactionUpdate,
};
pub use user::{
    AuthSession, LoginInput, PasswordChange, ProfileUpdate, RegisterForm, RegisterInput, User,
};

/// Anything the API identifies by an `id` field
pub trait Entity {
    fn id(&self) -> &str;
}

/// Implements `as_str`, `Display` and `FromStr` for the lowercase wire enums
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}' (expected one of: {})",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

pub(crate) use wire_enum;
