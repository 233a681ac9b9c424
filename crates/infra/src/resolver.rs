//! Customer resolution for staff-entered orders.
//!
//! Lookup order: explicit id, then email, then phone. When nothing matches an
//! account is created with a generated password and, if needed, a placeholder
//! phone. A unique violation on create means another request created the
//! same customer first; the lookups are retried and the winner is reused.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use lustre_auth::{Role, generate_password, hash_password};
use lustre_core::UserId;
use lustre_orders::looks_like_email;

use crate::error::LifecycleError;
use crate::store::{Account, AccountStore, NewAccount, StoreError};

/// Contact details captured at the counter for a walk-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Who an offline order is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerRef {
    Existing(UserId),
    Contact(ContactInfo),
}

/// The account an offline order will belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCustomer {
    pub account: Account,
    /// True when the account was created by this resolution.
    pub created: bool,
}

/// Result of a side-effect-free customer lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerLookup {
    Found(Account),
    /// No account matches; holds the normalized contact to create one from.
    Missing(ContactInfo),
}

const PLACEHOLDER_PHONE_PREFIX: &str = "OFFLINE-";

/// Placeholder phone for accounts created without a usable phone number.
pub fn placeholder_phone<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> String {
    format!(
        "{PLACEHOLDER_PHONE_PREFIX}{}-{:06}",
        now.timestamp_millis(),
        rng.gen_range(0..1_000_000u32)
    )
}

pub fn is_placeholder_phone(phone: &str) -> bool {
    phone.starts_with(PLACEHOLDER_PHONE_PREFIX)
}

#[derive(Clone)]
pub struct CustomerResolver {
    accounts: Arc<dyn AccountStore>,
}

impl CustomerResolver {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Resolve `customer`, creating an account when no existing one matches.
    pub async fn resolve(
        &self,
        customer: CustomerRef,
        now: DateTime<Utc>,
    ) -> Result<ResolvedCustomer, LifecycleError> {
        let lookup = self.find(customer).await?;
        self.obtain(lookup, now).await
    }

    /// Look the customer up without creating anything.
    #[instrument(skip(self, customer), err)]
    pub async fn find(&self, customer: CustomerRef) -> Result<CustomerLookup, LifecycleError> {
        match customer {
            CustomerRef::Existing(id) => self
                .accounts
                .find_by_id(id)
                .await?
                .map(CustomerLookup::Found)
                .ok_or_else(|| LifecycleError::not_found("customer")),
            CustomerRef::Contact(contact) => {
                let contact = normalize(contact)?;
                Ok(match self.lookup(&contact).await? {
                    Some(account) => CustomerLookup::Found(account),
                    None => CustomerLookup::Missing(contact),
                })
            }
        }
    }

    /// Turn a lookup into an account, creating one for a missing contact.
    #[instrument(skip(self, lookup), err)]
    pub async fn obtain(
        &self,
        lookup: CustomerLookup,
        now: DateTime<Utc>,
    ) -> Result<ResolvedCustomer, LifecycleError> {
        let contact = match lookup {
            CustomerLookup::Found(account) => {
                return Ok(ResolvedCustomer {
                    account,
                    created: false,
                });
            }
            CustomerLookup::Missing(contact) => contact,
        };

        match self.create(&contact, now).await {
            Ok(account) => {
                info!(user_id = %account.id, "customer account created for offline order");
                Ok(ResolvedCustomer {
                    account,
                    created: true,
                })
            }
            Err(LifecycleError::Store(StoreError::UniqueViolation(field))) => {
                info!(field = %field, "lost account creation race; reusing existing account");
                match self.lookup(&contact).await? {
                    Some(account) => Ok(ResolvedCustomer {
                        account,
                        created: false,
                    }),
                    None => Err(LifecycleError::Conflict(format!(
                        "an account with this {field} exists but could not be resolved"
                    ))),
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn lookup(&self, contact: &ContactInfo) -> Result<Option<Account>, StoreError> {
        if let Some(account) = self.accounts.find_by_email(&contact.email).await? {
            return Ok(Some(account));
        }
        match &contact.phone {
            Some(phone) => self.accounts.find_by_phone(phone).await,
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        contact: &ContactInfo,
        now: DateTime<Utc>,
    ) -> Result<Account, LifecycleError> {
        // The rng is scoped so no `ThreadRng` lives across an await point.
        let (password, fallback_phone) = {
            let mut rng = rand::thread_rng();
            (generate_password(&mut rng), placeholder_phone(&mut rng, now))
        };
        let password_hash = hash_password(&password)?;

        // `lookup` already reused any account owning the supplied phone, so a
        // supplied phone that is still taken here belongs to a concurrent create.
        let phone = match &contact.phone {
            Some(phone) if self.accounts.find_by_phone(phone).await?.is_none() => phone.clone(),
            _ => fallback_phone,
        };

        self.accounts
            .create(NewAccount {
                name: contact.name.clone(),
                email: contact.email.clone(),
                phone: Some(phone),
                password_hash,
                role: Role::CUSTOMER,
                created_at: now,
            })
            .await
            .map_err(LifecycleError::Store)
    }
}

impl core::fmt::Debug for CustomerResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CustomerResolver").finish_non_exhaustive()
    }
}

fn normalize(contact: ContactInfo) -> Result<ContactInfo, LifecycleError> {
    let name = contact.name.trim().to_string();
    let email = contact.email.trim().to_string();
    if name.is_empty() {
        return Err(LifecycleError::Validation("customer.name is required".to_string()));
    }
    if !looks_like_email(&email) {
        return Err(LifecycleError::Validation(
            "customer.email must be a valid email address".to_string(),
        ));
    }
    let phone = contact
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    Ok(ContactInfo { name, email, phone })
}
