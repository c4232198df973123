use std::mem::size_of;

use bytemuck::cast_slice;
use wgpu::util::DeviceExt;

use crate::kernels::{Kernels, ParamsPod};

/// Sizes of one allocation round, all in elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BufferDims {
    pub mask_len: usize,
    pub num_candidates: usize,
    pub num_groups: usize,
}

/// Device memory for one engine: allocated on the first upload, reused for
/// every following image, destroyed once on drop.
pub(crate) struct DeviceBuffers {
    pub mask: wgpu::Buffer,
    pub alphas: wgpu::Buffer,
    /// Per (candidate, workgroup) partial sums: written by `process_columns`,
    /// read by `sum_columns`.
    pub partials: wgpu::Buffer,
    pub totals: wgpu::Buffer,
    pub staging: wgpu::Buffer,
    pub params: wgpu::Buffer,
    pub process_bind_group: wgpu::BindGroup,
    pub sum_bind_group: wgpu::BindGroup,
    pub dims: BufferDims,
}

impl DeviceBuffers {
    pub fn allocate(
        device: &wgpu::Device,
        kernels: &Kernels,
        dims: BufferDims,
        alphas: &[f32],
    ) -> Self {
        debug_assert_eq!(alphas.len(), dims.num_candidates);
        let u32_bytes = size_of::<u32>() as u64;
        let totals_bytes = dims.num_candidates as u64 * u32_bytes;

        let mask = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("deslant.mask"),
            size: dims.mask_len as u64 * u32_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // the candidate set is fixed for the engine lifetime
        let alphas = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("deslant.alphas"),
            contents: cast_slice(alphas),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let partials = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("deslant.partials"),
            size: (dims.num_candidates * dims.num_groups) as u64 * u32_bytes,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        let totals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("deslant.totals"),
            size: totals_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("deslant.staging"),
            size: totals_bytes,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("deslant.params"),
            size: size_of::<ParamsPod>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let process_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("deslant.process_columns.bind_group"),
            layout: &kernels.process_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: mask.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: alphas.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: partials.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params.as_entire_binding(),
                },
            ],
        });
        let sum_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("deslant.sum_columns.bind_group"),
            layout: &kernels.sum_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: partials.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: totals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
            ],
        });

        log::debug!(
            "allocated device buffers: mask={} candidates={} groups={}",
            dims.mask_len,
            dims.num_candidates,
            dims.num_groups
        );

        Self {
            mask,
            alphas,
            partials,
            totals,
            staging,
            params,
            process_bind_group,
            sum_bind_group,
            dims,
        }
    }

    pub fn totals_bytes(&self) -> u64 {
        (self.dims.num_candidates * size_of::<u32>()) as u64
    }
}

impl Drop for DeviceBuffers {
    fn drop(&mut self) {
        self.mask.destroy();
        self.alphas.destroy();
        self.partials.destroy();
        self.totals.destroy();
        self.staging.destroy();
        self.params.destroy();
        log::debug!("released device buffers");
    }
}
