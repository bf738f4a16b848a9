use circle_shared::api::{
    CountResponse, CreatedRangeParams, CreatorParams, ExistsResponse, ListParams, Page,
    PageParams,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::repo::{Entity, Repository};
use crate::service::CrudService;

pub mod accounts;
pub mod friendships;
pub mod profiles;

// Shared bodies of the generic endpoints. The per-resource handler functions
// stay thin wrappers over these, like the base-controller they replace.

pub(crate) async fn list<T, R>(
    service: &CrudService<T, R>,
    params: &ListParams,
) -> Result<Page<T>, AppError>
where
    T: Entity,
    R: Repository<T>,
{
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };
    match params.created_by.as_deref() {
        Some(creator) => service.find_page_by_created_by(creator, page).await,
        None => service.find_page(page).await,
    }
}

pub(crate) async fn count<T, R>(
    service: &CrudService<T, R>,
    params: &CreatorParams,
) -> Result<CountResponse, AppError>
where
    T: Entity,
    R: Repository<T>,
{
    let count = match params.created_by.as_deref() {
        Some(creator) => service.count_by_created_by(creator).await?,
        None => service.count().await?,
    };
    Ok(CountResponse { count })
}

pub(crate) async fn exists<T, R>(
    service: &CrudService<T, R>,
    id: Uuid,
    params: &CreatorParams,
) -> Result<ExistsResponse, AppError>
where
    T: Entity,
    R: Repository<T>,
{
    let exists = match params.created_by.as_deref() {
        Some(creator) => service.exists_by_id_and_created_by(id, creator).await?,
        None => service.exists_by_id(id).await?,
    };
    Ok(ExistsResponse { exists })
}

pub(crate) async fn created_in<T, R>(
    service: &CrudService<T, R>,
    params: &CreatedRangeParams,
) -> Result<Vec<T>, AppError>
where
    T: Entity,
    R: Repository<T>,
{
    match params.end {
        Some(end) => service.find_created_between(params.start, end).await,
        None => service.find_created_after(params.start).await,
    }
}
