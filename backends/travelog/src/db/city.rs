use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};

use super::User;

pub type CityId = i64;

#[derive(Debug, Clone, FromRow)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub country: String,
    pub trip_count: i64,
}

impl City {
    pub fn slug(&self) -> String {
        city_slug(&self.name, &self.country)
    }

    pub fn matches(&self, query: &str) -> bool {
        format!("{}, {}", self.name, self.country)
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}

/// Case-folded form of a city or country name. Two spellings are the same
/// place when their keys match.
pub fn city_key(value: &str) -> String {
    value.trim().to_lowercase()
}

// Display only, never looked up by.
pub fn city_slug(name: &str, country: &str) -> String {
    format!("{}_{}", slug::slugify(name), slug::slugify(country))
}

const CITY_SELECT: &str = "
    SELECT
        cities.id,
        cities.name,
        cities.country,
        (SELECT COUNT(*) FROM trips WHERE trips.city_id = cities.id) AS trip_count
    FROM cities
";

/// Resolves the stable id for a (city, country) pair, creating it on first
/// use. Matching goes through [`city_key`], the first spelling seen is kept.
pub async fn get_or_create_city(
    conn: &mut SqliteConnection,
    name: &str,
    country: &str,
) -> AppResult<CityId> {
    let name_key = city_key(name);
    let country_key = city_key(country);

    sqlx::query(
        "
        INSERT INTO cities (name, country, name_key, country_key)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (name_key, country_key) DO NOTHING
        ",
    )
    .bind(name)
    .bind(country)
    .bind(&name_key)
    .bind(&country_key)
    .execute(&mut *conn)
    .await?;

    let id = sqlx::query_scalar("SELECT id FROM cities WHERE name_key = ? AND country_key = ?")
        .bind(&name_key)
        .bind(&country_key)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Cities that at least one trip was logged in.
pub async fn list_cities(pool: &SqlitePool) -> AppResult<Vec<City>> {
    let sql = format!(
        "{CITY_SELECT}
        WHERE EXISTS (SELECT 1 FROM trips WHERE trips.city_id = cities.id)
        ORDER BY cities.country_key, cities.name_key"
    );

    let cities = sqlx::query_as::<_, City>(&sql).fetch_all(pool).await?;
    Ok(cities)
}

pub async fn search_cities(pool: &SqlitePool, query: &str) -> AppResult<Vec<City>> {
    let cities = list_cities(pool).await?;
    Ok(cities.into_iter().filter(|city| city.matches(query)).collect())
}

pub async fn get_city(pool: &SqlitePool, city_id: CityId) -> AppResult<City> {
    let sql = format!("{CITY_SELECT} WHERE cities.id = ?");

    let city = sqlx::query_as::<_, City>(&sql)
        .bind(city_id)
        .fetch_optional(pool)
        .await?;

    city.ok_or(AppError::not_found("City"))
}

pub async fn list_city_users(pool: &SqlitePool, city_id: CityId) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "
        SELECT DISTINCT users.id, users.username, users.email, users.avatar_url
        FROM trips
        INNER JOIN users ON users.id = trips.user_id
        WHERE trips.city_id = ?
        ORDER BY users.username
        ",
    )
    .bind(city_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn city(name: &str, country: &str) -> City {
        City {
            id: 1,
            name: name.to_string(),
            country: country.to_string(),
            trip_count: 1,
        }
    }

    #[rstest]
    #[case("Paris", "France", "paris_france")]
    #[case("New York City", "United States", "new-york-city_united-states")]
    #[case("São Paulo", "Brazil", "sao-paulo_brazil")]
    fn builds_display_slugs(#[case] name: &str, #[case] country: &str, #[case] expected: &str) {
        assert_eq!(city_slug(name, country), expected);
    }

    #[rstest]
    #[case("par", true)]
    #[case("PARIS", true)]
    #[case("s, fr", true)]
    #[case("france", true)]
    #[case("lyon", false)]
    fn matches_city_and_country(#[case] query: &str, #[case] expected: bool) {
        assert_eq!(city("Paris", "France").matches(query), expected);
    }

    #[rstest]
    #[case("Paris", "paris")]
    #[case("  ZÜRICH ", "zürich")]
    #[case("Ålesund", "ålesund")]
    fn folds_names_to_a_lookup_key(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(city_key(raw), expected);
    }

    #[test]
    fn treats_like_wildcards_literally() {
        assert!(!city("Paris", "France").matches("%"));
        assert!(!city("Paris", "France").matches("p_r"));
    }
}
