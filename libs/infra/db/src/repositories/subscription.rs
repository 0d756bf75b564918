// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/subscription.rs]
/*!
 * =================================================================
 * APARATO: SUBSCRIPTION REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CRUD DE SUSCRIPCIONES Y CANDIDATOS PARA EL BATCHER
 *
 * La composicion de entidades cambiadas por BatchKey vive en la capa de
 * orquestacion (apps/server): este repositorio solo resuelve que
 * suscripciones observan un `resource_type` dado, listas para ser
 * filtradas por `sep2_domain_subscription::matches_subscription`.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::archival::delete_rows_into_archive;
use crate::time::{parse_utc, to_rfc3339};
use crate::DbClient;
use libsql::{params, Row};
use sep2_domain_model::{ConditionAttribute, Subscription, SubscriptionCondition, SubscriptionResource};
use tracing::instrument;

const SUBSCRIPTION_COLUMNS: &[&str] = &[
    "subscription_id",
    "aggregator_id",
    "resource_type",
    "resource_id",
    "scoped_site_id",
    "notification_uri",
    "entity_limit",
    "condition_attribute",
    "condition_lower_threshold",
    "condition_upper_threshold",
    "changed_time",
];

fn resource_type_to_text(resource_type: SubscriptionResource) -> &'static str {
    match resource_type {
        SubscriptionResource::EndDeviceList => "END_DEVICE_LIST",
        SubscriptionResource::EndDevice => "END_DEVICE",
        SubscriptionResource::DerControlList => "DER_CONTROL_LIST",
        SubscriptionResource::ReadingList => "READING_LIST",
        SubscriptionResource::RateComponentList => "RATE_COMPONENT_LIST",
    }
}

fn resource_type_from_text(value: &str) -> Result<SubscriptionResource, DbError> {
    Ok(match value {
        "END_DEVICE_LIST" => SubscriptionResource::EndDeviceList,
        "END_DEVICE" => SubscriptionResource::EndDevice,
        "DER_CONTROL_LIST" => SubscriptionResource::DerControlList,
        "READING_LIST" => SubscriptionResource::ReadingList,
        "RATE_COMPONENT_LIST" => SubscriptionResource::RateComponentList,
        other => {
            return Err(DbError::MappingError(format!(
                "unknown subscription resource_type '{other}'"
            )))
        }
    })
}

pub struct SubscriptionRepository {
    client: DbClient,
}

impl SubscriptionRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    fn map_row(row: &Row) -> Result<Subscription, DbError> {
        let condition_attribute = row.get::<Option<String>>(7)?;
        let condition = condition_attribute.map(|attr| -> Result<SubscriptionCondition, DbError> {
            let attribute = match attr.as_str() {
                "READING_VALUE" => ConditionAttribute::ReadingValue,
                other => {
                    return Err(DbError::MappingError(format!(
                        "unknown condition attribute '{other}'"
                    )))
                }
            };
            Ok(SubscriptionCondition {
                attribute,
                lower_threshold: row.get::<Option<i64>>(8)?,
                upper_threshold: row.get::<Option<i64>>(9)?,
            })
        });
        let condition = condition.transpose()?;

        Ok(Subscription {
            subscription_id: row.get::<i64>(0)?,
            aggregator_id: row.get::<i64>(1)?,
            resource_type: resource_type_from_text(&row.get::<String>(2)?)?,
            resource_id: row.get::<Option<i64>>(3)?,
            scoped_site_id: row.get::<Option<i64>>(4)?,
            notification_uri: row.get::<String>(5)?,
            entity_limit: row.get::<i64>(6)?,
            changed_time: parse_utc(&row.get::<String>(10)?)?,
            condition,
        })
    }

    #[instrument(skip(self, subscription))]
    pub async fn create_subscription(&self, subscription: &Subscription) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let (condition_attribute, lower, upper) = match &subscription.condition {
            Some(cond) => (
                Some(match cond.attribute {
                    ConditionAttribute::ReadingValue => "READING_VALUE",
                }),
                cond.lower_threshold,
                cond.upper_threshold,
            ),
            None => (None, None, None),
        };
        connection
            .execute(
                "INSERT INTO subscriptions \
                 (subscription_id, aggregator_id, resource_type, resource_id, scoped_site_id, \
                  notification_uri, entity_limit, condition_attribute, condition_lower_threshold, \
                  condition_upper_threshold, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    subscription.subscription_id,
                    subscription.aggregator_id,
                    resource_type_to_text(subscription.resource_type),
                    subscription.resource_id,
                    subscription.scoped_site_id,
                    subscription.notification_uri.clone(),
                    subscription.entity_limit,
                    condition_attribute,
                    lower,
                    upper,
                    to_rfc3339(subscription.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_subscription(&self, subscription_id: i64) -> Result<Option<Subscription>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT subscription_id, aggregator_id, resource_type, resource_id, scoped_site_id, \
                        notification_uri, entity_limit, condition_attribute, condition_lower_threshold, \
                        condition_upper_threshold, changed_time \
                 FROM subscriptions WHERE subscription_id = ?1",
                params![subscription_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Candidatas a evaluar para un `resource_type` observado, ya
    /// filtradas por agregador propietario (regla de scope de claims).
    #[instrument(skip(self))]
    pub async fn list_subscriptions_for_resource(
        &self,
        aggregator_id: i64,
        resource_type: SubscriptionResource,
    ) -> Result<Vec<Subscription>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT subscription_id, aggregator_id, resource_type, resource_id, scoped_site_id, \
                        notification_uri, entity_limit, condition_attribute, condition_lower_threshold, \
                        condition_upper_threshold, changed_time \
                 FROM subscriptions WHERE aggregator_id = ?1 AND resource_type = ?2",
                params![aggregator_id, resource_type_to_text(resource_type)],
            )
            .await?;
        let mut subscriptions = Vec::new();
        while let Some(row) = rows.next().await? {
            subscriptions.push(Self::map_row(&row)?);
        }
        Ok(subscriptions)
    }

    #[instrument(skip(self))]
    pub async fn delete_subscription(&self, subscription_id: i64) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        delete_rows_into_archive(
            &connection,
            "subscriptions",
            "subscriptions_archive",
            SUBSCRIPTION_COLUMNS,
            "subscription_id = ?1",
            vec![subscription_id.into()],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn memory_client() -> DbClient {
        DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("in-memory db connects")
    }

    fn sample_subscription() -> Subscription {
        Subscription {
            subscription_id: 1,
            aggregator_id: 1,
            resource_type: SubscriptionResource::ReadingList,
            resource_id: None,
            scoped_site_id: Some(7),
            notification_uri: "https://example.test/cb".into(),
            entity_limit: 50,
            changed_time: Utc::now(),
            condition: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = SubscriptionRepository::new(memory_client().await);
        let sub = sample_subscription();
        repo.create_subscription(&sub).await.unwrap();
        let fetched = repo.get_subscription(1).await.unwrap().unwrap();
        assert_eq!(fetched.scoped_site_id, Some(7));
        assert_eq!(fetched.resource_type, SubscriptionResource::ReadingList);
    }

    #[tokio::test]
    async fn delete_moves_row_to_archive() {
        let repo = SubscriptionRepository::new(memory_client().await);
        repo.create_subscription(&sample_subscription()).await.unwrap();
        repo.delete_subscription(1).await.unwrap();
        assert!(repo.get_subscription(1).await.unwrap().is_none());
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/subscription.rs]
