//! Walks through every repository operation and prints the results.

use anyhow::{Context, Result};
use domain::models::client::{ClientFilter, ClientSummary, ClientUpdate, NewClient};
use persistence::repositories::ClientRepository;
use tracing::warn;

use crate::config::OutputFormat;

pub async fn run(repo: &mut ClientRepository, format: OutputFormat) -> Result<()> {
    repo.initialize_schema().await?;

    let nazar = repo
        .add_client(&NewClient::new("Nazar", "Nazarov"))
        .await?
        .context("client Nazar was rejected")?;
    let ivanov = repo
        .add_client(&NewClient::new("Vladimir", "Ivanov").with_email("ivanov@mail.server.ru"))
        .await?
        .context("client Ivanov was rejected")?;
    repo.add_client(
        &NewClient::new("Vladimir", "Vasechkin")
            .with_email("v.vas@mail.com")
            .with_phones(["+1-111-111-1111", "(495)000-00-00", "+0(000) 000 00 00"]),
    )
    .await?;
    if repo
        .add_client(&NewClient::new("Ivan", "Broken").with_email("not-an-email"))
        .await?
        .is_none()
    {
        warn!("Client with a malformed email was not created");
    }
    print_all(repo, "Clients after creation", format).await?;

    repo.add_phone(nazar, "1234567890").await?;
    print_all(repo, "Clients after adding a phone to the first client", format).await?;

    let mut tx = repo.begin().await?;
    tx.add_phone(ivanov, "+7 (812) 555-01-01").await?;
    tx.add_phone(ivanov, "8-800-555-35-35").await?;
    tx.commit().await?;
    print_all(repo, "Clients after adding two phones in one transaction", format).await?;

    repo.update_client(nazar, &ClientUpdate::default().first_name("Nazar Nazarovich"))
        .await?;
    repo.update_client(
        nazar,
        &ClientUpdate::default().phones(["+1-234-567-8989", "(499)000-00-00"]),
    )
    .await?;
    print_all(repo, "Clients after changing the first client", format).await?;

    repo.delete_phone(nazar, "(499)000-00-00").await?;
    print_all(repo, "Clients after deleting a phone of the first client", format).await?;

    repo.delete_client(nazar).await?;
    print_all(repo, "Clients after deleting the first client", format).await?;

    let found = repo
        .find_clients(&ClientFilter::default().first_name("Vladimir"))
        .await?;
    print_clients("Search by first name (Vladimir)", &found, format)?;

    let found = repo
        .find_clients(
            &ClientFilter::default()
                .first_name("Vladimir")
                .phone("+1-111-111-1111"),
        )
        .await?;
    print_clients(
        "Search by first name (Vladimir) and phone (+1-111-111-1111)",
        &found,
        format,
    )?;

    let found = repo
        .find_clients(&ClientFilter::default().email("ivanov@mail.server.ru"))
        .await?;
    print_clients("Search by email (ivanov@mail.server.ru)", &found, format)?;

    Ok(())
}

async fn print_all(repo: &mut ClientRepository, title: &str, format: OutputFormat) -> Result<()> {
    let clients = repo.list_all_clients().await?;
    print_clients(title, &clients, format)
}

fn print_clients(title: &str, clients: &[ClientSummary], format: OutputFormat) -> Result<()> {
    println!("{title}:");
    match format {
        OutputFormat::Text => {
            for client in clients {
                println!("{client}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(clients)?),
    }
    println!();
    Ok(())
}
