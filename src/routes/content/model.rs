use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Shops,
    Schools,
    Services,
    Announcements,
}

impl FromStr for ContentKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shops" => Ok(ContentKind::Shops),
            "schools" => Ok(ContentKind::Schools),
            "services" => Ok(ContentKind::Services),
            "announcements" => Ok(ContentKind::Announcements),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Normalized list filter; "Все"/"all" and blank categories mean no filter.
#[derive(Debug, Default)]
pub struct ListFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListFilter {
    pub fn from_query(query: &ContentQuery) -> Self {
        let category = query
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "Все" && !c.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        let search = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        ListFilter { category, search }
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub rating: f64,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub rating: f64,
    pub hours: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub price: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub courses: Vec<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub rating: f64,
    pub hours: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub services: Vec<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub contact: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Superset of the four entity payloads; each kind reads the fields it knows.
#[derive(Debug, Default, Deserialize)]
pub struct ContentPayload {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub hours: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub price: Option<String>,
    pub website: Option<String>,
    pub author: Option<String>,
    pub contact: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListFilter, name_col: &str) {
    if let Some(category) = &filter.category {
        qb.push(" AND category = ");
        qb.push_bind(category.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(format!(" AND ({} ILIKE ", name_col));
        qb.push_bind(pattern.clone());
        qb.push(" OR description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

impl Shop {
    pub async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT * FROM shops WHERE 1=1");
        push_filters(&mut qb, filter, "name");
        qb.push(" ORDER BY created_at DESC");
        qb.build_query_as::<Shop>().fetch_all(pool).await
    }

    pub async fn create(pool: &PgPool, p: &ContentPayload) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO shops (name, description, category, image, rating, location, phone, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(p.name.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.rating.unwrap_or(0.0))
        .bind(p.location.as_deref())
        .bind(p.phone.as_deref())
        .bind(p.website.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i64, p: &ContentPayload) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE shops SET
                name = $1, description = $2, category = $3, image = $4, rating = $5,
                location = $6, phone = $7, website = $8, updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(p.name.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.rating.unwrap_or(0.0))
        .bind(p.location.as_deref())
        .bind(p.phone.as_deref())
        .bind(p.website.as_deref())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Loads child names keyed by parent id in one round trip.
async fn children_by_parent(
    pool: &PgPool,
    sql: &str,
    parent_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>, sqlx::Error> {
    let rows: Vec<(i64, String)> = sqlx::query_as(sql)
        .bind(parent_ids)
        .fetch_all(pool)
        .await?;
    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for (parent_id, name) in rows {
        map.entry(parent_id).or_default().push(name);
    }
    Ok(map)
}

impl School {
    pub async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT * FROM schools WHERE 1=1");
        push_filters(&mut qb, filter, "name");
        qb.push(" ORDER BY created_at DESC");
        let mut schools = qb.build_query_as::<School>().fetch_all(pool).await?;

        let ids: Vec<i64> = schools.iter().map(|s| s.id).collect();
        if !ids.is_empty() {
            let mut courses = children_by_parent(
                pool,
                "SELECT school_id, course_name FROM school_courses WHERE school_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?;
            for school in &mut schools {
                school.courses = courses.remove(&school.id).unwrap_or_default();
            }
        }
        Ok(schools)
    }

    pub async fn create(pool: &PgPool, p: &ContentPayload) -> Result<i64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO schools (name, description, category, image, rating, hours, location, phone, price, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(p.name.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.rating.unwrap_or(0.0))
        .bind(p.hours.as_deref())
        .bind(p.location.as_deref())
        .bind(p.phone.as_deref())
        .bind(p.price.as_deref())
        .bind(p.website.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for course in &p.courses {
            sqlx::query("INSERT INTO school_courses (school_id, course_name) VALUES ($1, $2)")
                .bind(id)
                .bind(course)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    pub async fn update(pool: &PgPool, id: i64, p: &ContentPayload) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE schools SET
                name = $1, description = $2, category = $3, image = $4, rating = $5,
                hours = $6, location = $7, phone = $8, price = $9, website = $10,
                updated_at = NOW()
            WHERE id = $11
            "#,
        )
        .bind(p.name.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.rating.unwrap_or(0.0))
        .bind(p.hours.as_deref())
        .bind(p.location.as_deref())
        .bind(p.phone.as_deref())
        .bind(p.price.as_deref())
        .bind(p.website.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        // Course list is replaced wholesale.
        sqlx::query("DELETE FROM school_courses WHERE school_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for course in &p.courses {
            sqlx::query("INSERT INTO school_courses (school_id, course_name) VALUES ($1, $2)")
                .bind(id)
                .bind(course)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

impl Service {
    pub async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT * FROM services WHERE 1=1");
        push_filters(&mut qb, filter, "name");
        qb.push(" ORDER BY created_at DESC");
        let mut services = qb.build_query_as::<Service>().fetch_all(pool).await?;

        let ids: Vec<i64> = services.iter().map(|s| s.id).collect();
        if !ids.is_empty() {
            let mut items = children_by_parent(
                pool,
                "SELECT service_id, service_name FROM service_items WHERE service_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?;
            for service in &mut services {
                service.services = items.remove(&service.id).unwrap_or_default();
            }
        }
        Ok(services)
    }

    pub async fn create(pool: &PgPool, p: &ContentPayload) -> Result<i64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO services (name, description, category, image, rating, hours, location, phone, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(p.name.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.rating.unwrap_or(0.0))
        .bind(p.hours.as_deref())
        .bind(p.location.as_deref())
        .bind(p.phone.as_deref())
        .bind(p.website.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for item in &p.services {
            sqlx::query("INSERT INTO service_items (service_id, service_name) VALUES ($1, $2)")
                .bind(id)
                .bind(item)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    pub async fn update(pool: &PgPool, id: i64, p: &ContentPayload) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE services SET
                name = $1, description = $2, category = $3, image = $4, rating = $5,
                hours = $6, location = $7, phone = $8, website = $9, updated_at = NOW()
            WHERE id = $10
            "#,
        )
        .bind(p.name.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.rating.unwrap_or(0.0))
        .bind(p.hours.as_deref())
        .bind(p.location.as_deref())
        .bind(p.phone.as_deref())
        .bind(p.website.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM service_items WHERE service_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for item in &p.services {
            sqlx::query("INSERT INTO service_items (service_id, service_name) VALUES ($1, $2)")
                .bind(id)
                .bind(item)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

impl Announcement {
    pub async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT * FROM announcements WHERE status = 'active'");
        push_filters(&mut qb, filter, "title");
        qb.push(" ORDER BY created_at DESC");
        qb.build_query_as::<Announcement>().fetch_all(pool).await
    }

    pub async fn create(pool: &PgPool, p: &ContentPayload) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO announcements (title, description, category, image, author, contact, price, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(p.title.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.author.as_deref())
        .bind(p.contact.as_deref())
        .bind(p.price.as_deref())
        .bind(p.location.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i64, p: &ContentPayload) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE announcements SET
                title = $1, description = $2, category = $3, image = $4,
                price = $5, location = $6, status = $7, updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(p.title.as_deref())
        .bind(p.description.as_deref())
        .bind(p.category.as_deref())
        .bind(p.image.as_deref())
        .bind(p.price.as_deref())
        .bind(p.location.as_deref())
        .bind(p.status.as_deref().unwrap_or("active"))
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Drops an entity row; child rows go first inside one transaction.
pub async fn delete_entity(pool: &PgPool, kind: ContentKind, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let child_sql = match kind {
        ContentKind::Schools => Some("DELETE FROM school_courses WHERE school_id = $1"),
        ContentKind::Services => Some("DELETE FROM service_items WHERE service_id = $1"),
        _ => None,
    };
    if let Some(sql) = child_sql {
        sqlx::query(sql).bind(id).execute(&mut *tx).await?;
    }

    let sql = match kind {
        ContentKind::Shops => "DELETE FROM shops WHERE id = $1",
        ContentKind::Schools => "DELETE FROM schools WHERE id = $1",
        ContentKind::Services => "DELETE FROM services WHERE id = $1",
        ContentKind::Announcements => "DELETE FROM announcements WHERE id = $1",
    };
    let result = sqlx::query(sql).bind(id).execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(kind: &str, category: Option<&str>, search: Option<&str>) -> ContentQuery {
        ContentQuery {
            kind: Some(kind.to_string()),
            category: category.map(str::to_string),
            search: search.map(str::to_string),
        }
    }

    #[test]
    fn kind_parses_the_four_entities() {
        assert_eq!("shops".parse(), Ok(ContentKind::Shops));
        assert_eq!("schools".parse(), Ok(ContentKind::Schools));
        assert_eq!("services".parse(), Ok(ContentKind::Services));
        assert_eq!("announcements".parse(), Ok(ContentKind::Announcements));
        assert!("products".parse::<ContentKind>().is_err());
    }

    #[test]
    fn catch_all_categories_mean_no_filter() {
        for cat in ["Все", "all", "All", ""] {
            let filter = ListFilter::from_query(&query("shops", Some(cat), None));
            assert!(filter.category.is_none(), "category {:?}", cat);
        }
        let filter = ListFilter::from_query(&query("shops", Some("Экипировка"), None));
        assert_eq!(filter.category.as_deref(), Some("Экипировка"));
    }

    #[test]
    fn blank_search_is_dropped() {
        let filter = ListFilter::from_query(&query("shops", None, Some("")));
        assert!(filter.search.is_none());
        let filter = ListFilter::from_query(&query("shops", None, Some("шлем")));
        assert_eq!(filter.search.as_deref(), Some("шлем"));
    }
}
