use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iknowaspot::app::auth::AuthService;
use iknowaspot::app::feed::{FeedScreen, ScreenStatus};
use iknowaspot::app::geo::{directions_url, distance_to_post};
use iknowaspot::app::media::MediaService;
use iknowaspot::app::posts::SavedPostService;
use iknowaspot::app::social::SocialService;
use iknowaspot::app::users::UserService;
use iknowaspot::app::view::SortMode;
use iknowaspot::config::AppConfig;
use iknowaspot::domain::media::NewSpot;
use iknowaspot::domain::post::{Coordinates, Post, Vote, UNTITLED_SPOT};
use iknowaspot::domain::tag::tag_color;
use iknowaspot::domain::user::SessionState;
use iknowaspot::AppState;

const USAGE: &str = "usage: iknowaspot <command> [args]

commands:
  login <email> <password>
  register <email> <username> <password>
  logout
  whoami
  feed [recent|top] [tag,tag,...]
  vote <post_id> <up|down|clear>
  saved
  save <post_id>
  friends
  add-friend <user_id>
  distance <post_id> <latitude> <longitude>
  upload <file> <title> <latitude> <longitude> [description] [tag,tag,...]";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config)?;

    match command.as_str() {
        "login" => {
            let [email, password] = expect_args::<2>(rest)?;
            AuthService::new(state.api.clone()).login(email, password).await?;
            println!("signed in");
        }
        "register" => {
            let [email, username, password] = expect_args::<3>(rest)?;
            AuthService::new(state.api.clone())
                .register(email, username, password)
                .await?;
            println!("account created, now sign in with `login`");
        }
        "logout" => {
            AuthService::new(state.api.clone()).sign_out().await?;
            println!("signed out");
        }
        "whoami" => whoami(&state).await?,
        "feed" => feed(&state, rest).await?,
        "vote" => {
            let [post_id, value] = expect_args::<2>(rest)?;
            vote(&state, parse_post_id(post_id)?, value).await?;
        }
        "saved" => {
            let saved = SavedPostService::new(state.api.clone()).saved_posts().await?;
            if saved.is_empty() {
                println!("No saved posts yet.");
            }
            for post in &saved {
                print_post(post);
            }
        }
        "save" => {
            let [post_id] = expect_args::<1>(rest)?;
            let saved = SavedPostService::new(state.api.clone())
                .toggle_save(parse_post_id(post_id)?)
                .await?;
            println!("{}", if saved { "saved" } else { "removed from saved" });
        }
        "friends" => {
            let friends = SocialService::new(state.api.clone()).friends().await?;
            for friend in friends {
                println!(
                    "{}\t{}",
                    friend.id,
                    friend.username.as_deref().unwrap_or("(no username)")
                );
            }
        }
        "add-friend" => {
            let [user_id] = expect_args::<1>(rest)?;
            let outcome = SocialService::new(state.api.clone())
                .add_friend(user_id)
                .await?;
            println!(
                "{:?}: {}",
                outcome.status,
                outcome.message.as_deref().unwrap_or_default()
            );
        }
        "distance" => {
            let [post_id, latitude, longitude] = expect_args::<3>(rest)?;
            let viewer = Coordinates::new(parse_degrees(latitude)?, parse_degrees(longitude)?);
            distance(&state, parse_post_id(post_id)?, viewer).await?;
        }
        "upload" => upload(&state, rest).await?,
        other => return Err(anyhow!("unknown command: {}\n\n{}", other, USAGE)),
    }

    Ok(())
}

async fn whoami(state: &AppState) -> Result<()> {
    let auth = AuthService::new(state.api.clone());
    if auth.restore_session().await == SessionState::SignedOut {
        println!("not signed in");
        return Ok(());
    }

    let page = UserService::new(state.api.clone()).load_profile_page().await?;
    match page.profile {
        Some(profile) => println!(
            "{} ({}) - {} posts, {} saved",
            profile.username,
            profile.email,
            profile.posts.len(),
            page.saved.len()
        ),
        None => println!("not signed in"),
    }
    Ok(())
}

async fn feed(state: &AppState, rest: &[String]) -> Result<()> {
    let screen = FeedScreen::mount(state);
    if let Some(sort) = rest.first() {
        screen
            .set_sort(sort.parse::<SortMode>().map_err(|err| anyhow!(err))?)
            .await;
    }
    if let Some(tags) = rest.get(1) {
        screen
            .set_tags(tags.split(',').map(str::trim).filter(|tag| !tag.is_empty()))
            .await;
    }

    screen.load().await;
    if let ScreenStatus::Error(message) = screen.status().await {
        return Err(anyhow!(message));
    }

    let posts = screen.visible().await;
    if posts.is_empty() {
        println!("No spots to show.");
    }
    for post in &posts {
        print_post(post);
    }
    Ok(())
}

async fn vote(state: &AppState, post_id: i64, value: &str) -> Result<()> {
    let next = Vote::parse(value).ok_or_else(|| anyhow!("vote must be up, down or clear"))?;
    let screen = FeedScreen::mount(state);
    screen.load().await;

    let outcome = screen.vote(post_id, next).await.await?;
    match screen.post(post_id).await {
        Some(post) => println!("{:?}: score {} (your vote {})", outcome, post.score, post.user_vote.value()),
        None => println!("{:?}", outcome),
    }
    Ok(())
}

async fn distance(state: &AppState, post_id: i64, viewer: Coordinates) -> Result<()> {
    let screen = FeedScreen::mount(state);
    screen.load().await;

    let post = screen
        .post(post_id)
        .await
        .ok_or_else(|| anyhow!("post {} not found", post_id))?;
    let miles = distance_to_post(viewer, &post)
        .ok_or_else(|| anyhow!("post {} has no location", post_id))?;
    let spot = post
        .coordinates()
        .ok_or_else(|| anyhow!("post {} has no location", post_id))?;

    println!("{:.2} miles away", miles);
    println!("{}", directions_url(Some(viewer), spot)?);
    Ok(())
}

async fn upload(state: &AppState, rest: &[String]) -> Result<()> {
    if rest.len() < 4 {
        return Err(anyhow!("upload needs <file> <title> <latitude> <longitude>"));
    }
    let path = std::path::Path::new(&rest[0]);
    let photo = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let spot = NewSpot {
        title: rest[1].clone(),
        latitude: parse_degrees(&rest[2])?,
        longitude: parse_degrees(&rest[3])?,
        description: rest.get(4).cloned().unwrap_or_default(),
        tags: rest
            .get(5)
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    };

    let file_name = path.file_name().and_then(|name| name.to_str());
    let uploaded = MediaService::new(state.api.clone())
        .upload_spot(Bytes::from(photo), file_name, &spot)
        .await?;
    println!("uploaded {}", uploaded.file_url);
    Ok(())
}

fn print_post(post: &Post) {
    let title = if post.title.is_empty() {
        UNTITLED_SPOT
    } else {
        post.title.as_str()
    };
    let description = if post.description.is_empty() {
        "No description provided."
    } else {
        post.description.as_str()
    };
    let location = match post.coordinates() {
        Some(at) => format!("{:.4}, {:.4}", at.latitude, at.longitude),
        None => "N/A".to_string(),
    };
    let tags: Vec<String> = post
        .tags
        .iter()
        .map(|tag| match tag_color(tag) {
            Some(color) => format!("{}({})", tag, color),
            None => tag.clone(),
        })
        .collect();

    println!("#{} {} [score {}]", post.id, title, post.score);
    println!("    {}", description);
    println!("    at {}  {}", location, tags.join(" "));
}

fn expect_args<const N: usize>(rest: &[String]) -> Result<[&str; N]> {
    if rest.len() != N {
        return Err(anyhow!("expected {} argument(s), got {}\n\n{}", N, rest.len(), USAGE));
    }
    let mut out = [""; N];
    for (slot, value) in out.iter_mut().zip(rest) {
        *slot = value.as_str();
    }
    Ok(out)
}

fn parse_post_id(value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|err| anyhow!("invalid post id {}: {}", value, err))
}

fn parse_degrees(value: &str) -> Result<f64> {
    let degrees: f64 = value
        .trim()
        .parse()
        .map_err(|err| anyhow!("invalid coordinate {}: {}", value, err))?;
    if !degrees.is_finite() {
        return Err(anyhow!("invalid coordinate {}", value));
    }
    Ok(degrees)
}
