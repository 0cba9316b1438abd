//! Seeds an admin account and a small sample catalog into the configured
//! Postgres database. Safe to re-run: existing data is left alone.
//!
//! `SEED_ADMIN_PASSWORD` is required; `SEED_ADMIN_USERNAME` and
//! `SEED_ADMIN_EMAIL` default to `admin` / `admin@moviespace.local`.

use anyhow::{bail, Context};
use auth_adapters::Argon2Hasher;
use chrono::NaiveDate;
use configs::{Settings, StorageBackend};
use domains::{
    ContentStatus, MovieRepo, MusicRepo, NewMovie, NewMusic, NewShort, PasswordHasher, Role,
    ShortRepo, User, UserRepo,
};
use secrecy::{ExposeSecret, SecretString};
use storage_adapters::PgStore;
use tracing::info;

/// A published movie with the given basics.
fn movie(title: &str, genres: &[&str], director: &str, year: i32, minutes: i32) -> NewMovie {
    NewMovie {
        title: title.into(),
        description: format!("{title}, directed by {director}."),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        language: "English".into(),
        director: director.into(),
        release_date: NaiveDate::from_ymd_opt(year, 1, 1),
        duration_minutes: Some(minutes),
        status: Some(ContentStatus::Published),
        poster_url: None,
        video_url: None,
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

async fn seed_admin(store: &PgStore) -> anyhow::Result<User> {
    let username = env_or("SEED_ADMIN_USERNAME", "admin");
    let email = env_or("SEED_ADMIN_EMAIL", "admin@moviespace.local");

    if let Some(existing) = UserRepo::find_by_login(store, &username).await? {
        info!(%username, "admin already exists");
        return Ok(existing);
    }

    let password = SecretString::from(
        std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD must be set")?,
    );
    if password.expose_secret().len() < 8 {
        bail!("SEED_ADMIN_PASSWORD must be at least 8 characters");
    }
    let hash = Argon2Hasher::new().hash(password.expose_secret())?;

    let mut admin = User::new(username.clone(), email, hash, "Administrator".into());
    admin.role = Role::Admin;
    let admin = UserRepo::insert(store, admin).await?;
    info!(%username, id = %admin.id, "admin created");
    Ok(admin)
}

async fn seed_catalog(store: &PgStore, uploader: &User) -> anyhow::Result<()> {
    if MovieRepo::count(store).await? > 0 {
        info!("catalog already has movies; skipping");
        return Ok(());
    }

    let movies = [
        movie("Arrival", &["Sci-Fi", "Drama"], "Denis Villeneuve", 2016, 116),
        movie("Blade Runner 2049", &["Sci-Fi", "Thriller"], "Denis Villeneuve", 2017, 164),
        movie("Heat", &["Crime", "Thriller"], "Michael Mann", 1995, 170),
        movie("Spirited Away", &["Animation", "Fantasy"], "Hayao Miyazaki", 2001, 125),
        movie("The Grand Budapest Hotel", &["Comedy", "Drama"], "Wes Anderson", 2014, 99),
        movie("Mad Max: Fury Road", &["Action", "Sci-Fi"], "George Miller", 2015, 120),
    ];
    for m in movies {
        MovieRepo::insert(store, m.into_movie(uploader.id)).await?;
    }

    let tracks = [
        ("Clair de Lune", "Claude Debussy", "Classical"),
        ("So What", "Miles Davis", "Jazz"),
        ("Windowlicker", "Aphex Twin", "Electronic"),
    ];
    for (title, artist, genre) in tracks {
        let track = NewMusic {
            title: title.into(),
            artist: artist.into(),
            genre: genre.into(),
            ..NewMusic::default()
        };
        MusicRepo::insert(store, track.into_music(uploader.id)).await?;
    }

    let short = NewShort {
        title: "Welcome to MovieSpace".into(),
        description: Some("A quick tour.".into()),
        video_url: "https://cdn.moviespace.local/shorts/welcome.mp4".into(),
    };
    ShortRepo::insert(store, short.into_short(uploader.id)).await?;

    info!(movies = 6, music = 3, shorts = 1, "sample catalog seeded");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&settings.log.filter))
        .init();

    if settings.storage.backend != StorageBackend::Postgres {
        bail!("seeding needs MOVIESPACE__STORAGE__BACKEND=postgres; the memory store does not persist");
    }

    let store = PgStore::connect(settings.database.url.expose_secret(), settings.database.max_connections)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    let admin = seed_admin(&store).await?;
    seed_catalog(&store, &admin).await?;
    Ok(())
}
