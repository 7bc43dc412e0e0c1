/*
 * Responsibility
 *  - path extractor を束ねる
 *  - 外部（handlers 等）に公開する型を制御する
 */
mod container_id;

pub use container_id::ContainerIdPath;
