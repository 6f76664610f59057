use crate::app::{AppContext, KioskError, Result};
use crate::domain::{collect_article_media, ArticlePage, MediaKind};
use crate::services::ArticleFilter;

pub async fn headlines(ctx: &AppContext, page: u32, limit: u32) -> Result<()> {
    let listing = ctx
        .services
        .articles
        .published(&ArticleFilter {
            page: Some(page),
            limit: Some(limit),
            ..ArticleFilter::default()
        })
        .await?;

    if listing.articles.is_empty() {
        println!("No published articles");
        return Ok(());
    }

    print_listing(&listing);
    Ok(())
}

pub async fn article(ctx: &AppContext, id: i64) -> Result<()> {
    let article = ctx.services.articles.by_id(id).await?;

    println!("{}", article.title);
    println!();

    let mut meta: Vec<String> = Vec::new();
    if let Some(category) = &article.category_name {
        meta.push(category.clone());
    }
    let date = article.display_date();
    if !date.is_empty() {
        meta.push(date);
    }
    meta.push(format!("{} views", article.view_count()));
    meta.push(format!("{} min read", article.reading_minutes()));
    println!("{}", meta.join(" | "));

    let tags = article.tag_list();
    if !tags.is_empty() {
        println!("Tags: {}", tags.join(", "));
    }

    println!();
    println!("{}", article.plain_body());

    let media = collect_article_media(&article);
    if !media.is_empty() {
        println!();
        println!("Media:");
        for item in &media {
            let marker = match item.kind {
                MediaKind::Video => "video",
                MediaKind::Image => "image",
            };
            println!("  [{}] {}", marker, item.url);
        }
    }

    let related = ctx
        .services
        .articles
        .related(article.id, article.category_id, Some(3))
        .await?;
    if !related.is_empty() {
        println!();
        println!("Related:");
        for item in &related {
            println!("  {:>6}  {}", item.id, item.title);
        }
    }

    Ok(())
}

pub async fn category(ctx: &AppContext, slug: &str, page: u32) -> Result<()> {
    let categories = ctx.services.categories.all().await?;
    let category = categories
        .into_iter()
        .find(|c| c.slug == slug)
        .ok_or_else(|| KioskError::CategoryNotFound(slug.to_string()))?;

    println!("{}", category.name);
    if let Some(description) = category.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{}", description);
    }
    println!();

    let listing = ctx
        .services
        .articles
        .published(&ArticleFilter {
            page: Some(page),
            limit: Some(12),
            category: Some(category.id),
            ..ArticleFilter::default()
        })
        .await?;

    if listing.articles.is_empty() {
        println!("No articles in this category");
        return Ok(());
    }

    print_listing(&listing);
    Ok(())
}

pub async fn search(ctx: &AppContext, term: &str, page: u32) -> Result<()> {
    let listing = ctx
        .services
        .articles
        .published(&ArticleFilter {
            page: Some(page),
            limit: Some(12),
            search: Some(term.to_string()),
            ..ArticleFilter::default()
        })
        .await?;

    if listing.articles.is_empty() {
        println!("No results for \"{}\"", term);
        return Ok(());
    }

    println!("Results for \"{}\":", term);
    print_listing(&listing);
    Ok(())
}

pub async fn trending(ctx: &AppContext, limit: u32) -> Result<()> {
    let articles = ctx.services.articles.trending(Some(limit)).await?;

    if articles.is_empty() {
        println!("No trending articles");
        return Ok(());
    }

    for article in &articles {
        println!(
            "{:>6}  {} ({} views)",
            article.id,
            article.title,
            article.view_count()
        );
    }
    Ok(())
}

pub async fn categories(ctx: &AppContext) -> Result<()> {
    let categories = ctx.services.categories.all().await?;

    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }

    for category in &categories {
        match category.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => println!("{:<16} {}", category.slug, description),
            None => println!("{}", category.slug),
        }
    }
    Ok(())
}

pub async fn settings(ctx: &AppContext) -> Result<()> {
    let settings = ctx.services.settings.public().await?;

    println!("{}", settings.display_name());
    println!("{}", settings.display_tagline());

    if let Some(description) = settings.site_description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{}", description);
    }

    let contacts = [
        ("Email", &settings.contact_email),
        ("Phone", &settings.contact_phone),
    ];
    for (label, value) in contacts {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("{}: {}", label, value);
        }
    }

    let socials = [
        ("Facebook", &settings.facebook_url),
        ("Twitter", &settings.twitter_url),
        ("Instagram", &settings.instagram_url),
        ("YouTube", &settings.youtube_url),
    ];
    for (label, value) in socials {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("{}: {}", label, value);
        }
    }

    Ok(())
}

pub async fn subscribe(ctx: &AppContext, email: &str) -> Result<()> {
    ctx.services.newsletter.subscribe(email).await?;
    println!("Subscribed: {}", email);
    Ok(())
}

fn print_listing(listing: &ArticlePage) {
    for article in &listing.articles {
        let date = article.display_date();
        if date.is_empty() {
            println!("{:>6}  {}", article.id, article.title);
        } else {
            println!("{:>6}  {}  ({})", article.id, article.title, date);
        }
        if !article.excerpt.is_empty() {
            println!("        {}", article.excerpt);
        }
    }
    println!();
    println!(
        "Page {} of {} ({} articles)",
        listing.page,
        listing.total_pages(),
        listing.total
    );
}
